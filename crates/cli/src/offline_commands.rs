//! `tvlogo search` and `tvlogo render`: the bot's lookups without Telegram.

use std::path::{Path, PathBuf};

use {
    anyhow::{Context, bail},
    tracing::info,
    tvlogo_catalog::Catalog,
    tvlogo_config::TvLogoConfig,
    tvlogo_gallery::{GalleryStore, UserId},
};

use crate::startup;

pub fn search(config: &TvLogoConfig, query: &str) -> anyhow::Result<()> {
    let catalog = startup::load_catalog(&config.data)?;
    let lines = search_lines(&catalog, query, config.search.display_limit);
    if lines.is_empty() {
        let suggestions = catalog.suggestions(3);
        println!("nothing found for {query:?}");
        if !suggestions.is_empty() {
            println!("try: {}", suggestions.join(" / "));
        }
        return Ok(());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// One line per hit: key, display name and whether its logo is on disk.
fn search_lines(catalog: &Catalog, query: &str, limit: usize) -> Vec<String> {
    let hits = catalog.search(query);
    let total = hits.len();
    let mut lines: Vec<String> = hits
        .into_iter()
        .take(limit)
        .map(|key| {
            let name = catalog.get(key).map_or(key, |entry| entry.name.as_str());
            let logo = match catalog.logo_path(key) {
                Some(path) if path.is_file() => path.display().to_string(),
                Some(path) => format!("missing: {}", path.display()),
                None => "no logo".to_string(),
            };
            format!("{key}\t{name}\t{logo}")
        })
        .collect();
    if total > limit {
        lines.push(format!("... {} more", total - limit));
    }
    lines
}

pub async fn render(config: &TvLogoConfig, user: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let user: UserId = user
        .parse()
        .with_context(|| format!("invalid user id {user:?}"))?;
    let catalog = startup::load_catalog(&config.data)?;
    let store = startup::open_gallery(&config.data).await;

    let dest = out.map_or_else(|| default_destination(config, &user), Path::to_path_buf);
    let summary = render_to_file(&catalog, &store, &user, &dest).await?;
    println!(
        "wrote {} ({} logos, {} could not be loaded)",
        dest.display(),
        summary.placed,
        summary.skipped
    );
    Ok(())
}

fn default_destination(config: &TvLogoConfig, user: &UserId) -> PathBuf {
    let name = tvlogo_pdf::export_file_name(user.as_str());
    match &config.pdf.export_dir {
        Some(dir) => dir.join(name),
        None => name,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RenderSummary {
    placed: usize,
    skipped: usize,
}

async fn render_to_file(
    catalog: &Catalog,
    store: &GalleryStore,
    user: &UserId,
    dest: &Path,
) -> anyhow::Result<RenderSummary> {
    let keys = store.get(user).await;
    if keys.is_empty() {
        bail!("gallery of user {user} is empty");
    }
    let paths: Vec<PathBuf> = keys
        .iter()
        .map(|key| catalog.logo_path(key).unwrap_or_default())
        .collect();

    let rendered = tvlogo_pdf::render(&paths)?;
    tvlogo_pdf::write_document(dest, &rendered.bytes)?;
    info!(
        user_id = %user,
        path = %dest.display(),
        count = keys.len(),
        "gallery exported"
    );
    Ok(RenderSummary {
        placed: rendered.placements.len(),
        skipped: rendered.skipped,
    })
}
