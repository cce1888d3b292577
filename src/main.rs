//! Waypress - WordPress export to travel-site data pipeline.

mod authors;
mod category;
mod cli;
mod config;
mod dates;
mod extract;
mod index;
mod logger;
mod normalize;
mod schema;
mod sitemap;
mod store;
mod wxr;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::PipelineConfig;
use serde_json::Value;
use store::DataStore;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli)?;

    match &cli.command {
        Commands::Extract { .. } => extract::run_extract(&config).map(|_| ()),
        Commands::Authors => authors::rebuild_authors(&config).map(|_| ()),
        Commands::Sitemap { .. } => sitemap::build_sitemaps(&config),
        Commands::Get { slug, schema } => print_post(&config, slug, *schema),
    }
}

/// Resolve one record through the chunked store (falling back to pages) and
/// print it, either as its stored form or as the JSON-LD blocks a rendered
/// page would embed.
fn print_post(config: &PipelineConfig, slug: &str, with_schema: bool) -> Result<()> {
    let store = DataStore::new(&config.extract.data_dir);
    let Some(post) = store.posts().get(slug)? else {
        if let Some(page) = store.page(slug)? {
            println!("{}", serde_json::to_string_pretty(&page)?);
            return Ok(());
        }
        bail!(
            "no post or page with slug `{slug}` ({} posts indexed)",
            store.posts().post_count()?
        );
    };

    if with_schema {
        let categories = store.category_map()?;
        let trail = schema::breadcrumb_trail(&post, &categories, config);
        let mut blocks = vec![
            schema::article(&post, &categories, config),
            schema::breadcrumbs(&trail),
            schema::website(config),
            schema::organization(config),
        ];
        // content was normalized at extract time, so this pass only
        // re-derives the headings
        let normalized = normalize::normalize(&post.content);
        if normalized.has_toc()
            && let Some(faq) = schema::faq(&normalized.toc, &normalized.html)
        {
            blocks.push(faq);
        }
        println!("{}", serde_json::to_string_pretty(&Value::Array(blocks))?);
    } else {
        println!("{}", serde_json::to_string_pretty(&post)?);
    }
    Ok(())
}
