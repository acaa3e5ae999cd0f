//! Configuration module

mod site;

pub use site::Accent;
pub use site::MarkdownConfig;
pub use site::Mode;
pub use site::SiteConfig;
pub use site::ThemeConfig;
