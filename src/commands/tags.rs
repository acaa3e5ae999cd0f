//! List tags with post counts

use anyhow::Result;

use crate::Folio;

/// Print every tag with the number of posts carrying it
pub async fn run(folio: &Folio) -> Result<()> {
    let repo = folio.load().await?;
    let counts = repo.tag_counts();

    println!("Tags ({}):", counts.len());
    for (tag, count) in counts {
        println!("  {} ({})", tag, count);
    }

    Ok(())
}
