//! Walk through a small lending scenario against the configured store.
//!
//! Uses the in-memory engine unless `BOOKGRAPH_DB_MODE` or a config file
//! says otherwise:
//!
//! ```text
//! cargo run -p bookgraph-storage --example lending_walkthrough
//! ```

use bookgraph_core::logging::init_logging;
use bookgraph_storage::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BookgraphConfig::load_or_default().await?;
    init_logging(&config.general.log_level)?;

    println!("=== bookgraph lending walkthrough ===\n");

    let repo = GraphRepository::connect(&config).await?;

    // ============================================================================
    // 1. Users and the follow graph
    // ============================================================================

    let ann = repo
        .create_user(UserProfile::new("Ann", "ann@example.com").with_location("Lisbon"))
        .await?;
    let bo = repo
        .create_user(UserProfile::new("Bo", "bo@example.com").with_external_id("fb-1001"))
        .await?;

    if !repo.is_following(&bo, &ann).await? {
        repo.create_following_relation(&bo, &ann).await?;
    }

    let followers = repo.get_followers(&ann).await?;
    println!("{} has {} follower(s):", ann.name(), followers.len());
    for follower in &followers {
        println!("  - {}", follower.name());
    }

    // ============================================================================
    // 2. Ann's shelf
    // ============================================================================

    let dune = repo
        .create_book(BookDetails::new("Dune", "Frank Herbert").with_isbn("9780441013593"))
        .await?;
    let emma = repo.create_book(BookDetails::new("Emma", "Jane Austen")).await?;

    repo.add_owned_book(ann.id(), dune.id(), OwnershipStatus::Available)
        .await?;
    repo.add_owned_book(ann.id(), emma.id(), OwnershipStatus::Available)
        .await?;

    // ============================================================================
    // 3. Bo borrows Dune
    // ============================================================================

    repo.update_ownership_status(ann.id(), dune.id(), OwnershipStatus::Lent)
        .await?;
    repo.add_borrowed_book(bo.id(), dune.id(), ann.id()).await?;

    for owned in repo.get_owned_books(ann.id()).await? {
        println!("{} owns '{}' ({})", ann.name(), owned.book.title(), owned.status());
    }
    for borrowed in repo.get_borrowed_books(bo.id()).await? {
        println!(
            "{} is reading '{}' since {}",
            bo.name(),
            borrowed.book.title(),
            borrowed.relation.borrowed_at.format("%Y-%m-%d %H:%M")
        );
    }

    // ============================================================================
    // 4. Cached lookups
    // ============================================================================

    repo.get_user_by_id(ann.id()).await?;
    repo.get_user_by_id(ann.id()).await?;
    repo.update_user(
        ann.id(),
        UserProfile::new("Ann", "ann@example.com").with_location("Porto"),
    )
    .await?;
    let moved = repo.get_user_by_id(ann.id()).await?;
    println!(
        "\n{} now lives in {}",
        moved.name(),
        moved.profile().location.as_deref().unwrap_or("an unknown place")
    );

    let stats = repo.cache_stats();
    println!(
        "Cache: {} hit(s), {} miss(es), {} invalidation(s), {:.0}% hit rate",
        stats.hits,
        stats.misses,
        stats.invalidations,
        stats.hit_rate()
    );

    Ok(())
}
