//! Article command handlers

use anyhow::{anyhow, bail, Result};

use moco_core::models::normalize_link;
use moco_core::{Article, ArticleDraft, Library};

use crate::output::Output;

/// Save a new article from a URL
pub async fn add(
    library: &Library,
    url: &str,
    tags: &[String],
    title: Option<String>,
    desc: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut draft = match library.extract(url).await {
        Some(draft) => draft,
        None => {
            let link = normalize_link(url).ok_or_else(|| anyhow!("Invalid link: {}", url))?;
            if title.is_none() {
                bail!("Could not read the link. Pass --title to save it anyway.");
            }
            ArticleDraft::new(link)
        }
    };

    if title.is_some() {
        draft.title = title;
    }
    if desc.is_some() {
        draft.desc = desc;
    }

    let link = draft.link.clone();
    if !library.save_draft(draft, &join_tags(tags)).await {
        bail!("Failed to save {}", link);
    }

    output.success(&format!("Saved {}", link));
    if let Some(article) = library.article_specified(&link).current() {
        output.print_article(&article);
    }
    Ok(())
}

/// List articles, optionally filtered by title
pub fn list(library: &Library, search: Option<String>, output: &Output) -> Result<()> {
    library.set_search(search.unwrap_or_default());
    output.print_articles(&library.articles_by_filter().current());
    Ok(())
}

/// Show a single article
pub fn show(library: &Library, link: &str, output: &Output) -> Result<()> {
    let article = find_article(library, link)?;
    output.print_article(&article);
    Ok(())
}

/// Edit an article's title, description or tags
pub async fn edit(
    library: &Library,
    link: &str,
    title: Option<String>,
    desc: Option<String>,
    tags: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut article = find_article(library, link)?;

    if let Some(title) = title {
        if title.trim().is_empty() {
            bail!("Title must not be empty");
        }
        article.title = title.trim().to_string();
    }
    if let Some(desc) = desc {
        article.desc = desc;
    }
    if let Some(tags) = tags {
        article.tags = tags;
    }

    if !library.update_article(article.clone()).await {
        bail!("Failed to update {}", article.link);
    }

    output.success("Article updated");
    if let Some(updated) = library.article_specified(&article.link).current() {
        output.print_article(&updated);
    }
    Ok(())
}

/// Delete an article
pub async fn delete(library: &Library, link: &str, output: &Output) -> Result<()> {
    let article = find_article(library, link)?;

    if !library.delete_article(&article).await {
        bail!("Failed to delete {}", article.link);
    }

    output.success(&format!("Deleted {}", article.link));
    Ok(())
}

/// Look up an article by its exact or normalized link
fn find_article(library: &Library, link: &str) -> Result<Article> {
    if let Some(article) = library.article_specified(link).current() {
        return Ok(article);
    }
    normalize_link(link)
        .and_then(|normalized| library.article_specified(&normalized).current())
        .ok_or_else(|| anyhow!("Article not found: {}", link))
}

/// Join repeated `-t` values into the stored comma-separated form
fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
