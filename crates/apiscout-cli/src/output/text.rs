//! Human-readable renderers

use apiscout_core::{Catalog, Chunk, MergedOutput, PipelineOutput};
use colored::Colorize;

fn join(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render a discovered catalog as an indented tree.
pub fn render_catalog(catalog: &Catalog) -> String {
    let title = catalog.title.as_deref().unwrap_or(&catalog.source_url);
    let mut lines = vec![format!(
        "{} {} ({} categories, {} endpoints)",
        "Catalog:".bold(),
        title,
        catalog.categories.len(),
        catalog.endpoint_count()
    )];

    if catalog.is_empty() {
        lines.push(format!("  {}", "No endpoints found".yellow()));
        return join(&lines);
    }

    for (index, category) in catalog.categories.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!(
            "{:>3}. {} ({})",
            index + 1,
            category.name.cyan().bold(),
            category.endpoints.len()
        ));
        if !category.description.is_empty() {
            lines.push(format!("     {}", category.description.dimmed()));
        }
        for endpoint in &category.endpoints {
            lines.push(format!("     {}  {}", endpoint.path.green(), endpoint.title));
        }
    }
    join(&lines)
}

/// Render a chunk plan, one line per chunk.
pub fn render_chunks(chunks: &[Chunk]) -> String {
    let endpoints: usize = chunks.iter().map(Chunk::len).sum();
    let mut lines = vec![format!(
        "{} {} chunks, {} endpoints",
        "Plan:".bold(),
        chunks.len(),
        endpoints
    )];
    for chunk in chunks {
        let categories: Vec<String> =
            chunk.covered_categories().into_iter().map(|c| c.name).collect();
        lines.push(format!(
            "  chunk {}/{}: {} endpoints [{}]",
            chunk.chunk_id,
            chunk.total_chunks,
            chunk.len(),
            categories.join(", ")
        ));
    }
    join(&lines)
}

/// Render merged categories with method and path per endpoint.
pub fn render_merged(merged: &MergedOutput) -> String {
    let mut lines = Vec::new();
    for category in &merged.categories {
        lines.push(String::new());
        lines.push(format!(
            "{} ({})",
            category.name.cyan().bold(),
            category.endpoints.len()
        ));
        if !category.description.is_empty() {
            lines.push(format!("  {}", category.description.dimmed()));
        }
        if category.endpoints.is_empty() {
            lines.push(format!("  {}", "(no endpoints extracted)".yellow()));
        }
        for endpoint in &category.endpoints {
            let method = if endpoint.method.is_empty() { "?" } else { &endpoint.method };
            lines.push(format!(
                "  {:<7} {}  {}",
                method.bold(),
                endpoint.path.green(),
                endpoint.description
            ));
        }
    }
    join(&lines)
}

/// Render the run summary, including failed and missing chunks.
pub fn render_summary(output: &PipelineOutput) -> String {
    let summary = output.summary();
    let status = if output.is_partial() {
        "Partial".yellow().bold()
    } else {
        "Complete".green().bold()
    };
    let mut lines = vec![format!(
        "{status}: {} endpoints extracted from {} selected, {}/{} chunks succeeded",
        output.merged.endpoint_count(),
        summary.endpoints_selected,
        summary.succeeded,
        summary.chunks
    )];

    for result in output.report.results.iter().filter(|r| !r.is_success()) {
        lines.push(format!(
            "  {} chunk {}: {}",
            "✗".red(),
            result.chunk_id,
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }
    if !output.report.missing_chunks.is_empty() {
        lines.push(format!(
            "  {} chunks never reported back: {:?}",
            "!".yellow(),
            output.report.missing_chunks
        ));
    }
    join(&lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use apiscout_core::{Category, EndpointRef, ExtractedEndpoint, MergedCategory, partition};

    fn catalog() -> Catalog {
        Catalog::new(
            "https://docs.example.com",
            vec![
                Category::new("Users", "User accounts")
                    .with_endpoint(EndpointRef::new("List", "/users", "u"))
                    .with_endpoint(EndpointRef::new("Get", "/users/{id}", "u")),
                Category::new("Repos", "").with_endpoint(EndpointRef::new("List", "/repos", "u")),
            ],
        )
    }

    #[test]
    fn test_render_catalog_lists_categories_and_paths() {
        colored::control::set_override(false);
        let text = render_catalog(&catalog());
        assert!(text.contains("2 categories, 3 endpoints"));
        assert!(text.contains("1. Users (2)"));
        assert!(text.contains("/users/{id}  Get"));
        assert!(text.contains("2. Repos (1)"));
    }

    #[test]
    fn test_render_empty_catalog() {
        colored::control::set_override(false);
        let text = render_catalog(&Catalog::new("https://x.test", Vec::new()));
        assert!(text.contains("No endpoints found"));
    }

    #[test]
    fn test_render_chunks() {
        colored::control::set_override(false);
        let chunks = partition(&catalog(), None, 2).unwrap();
        let text = render_chunks(&chunks);
        assert!(text.contains("2 chunks, 3 endpoints"));
        assert!(text.contains("chunk 1/2: 2 endpoints [Users]"));
        assert!(text.contains("chunk 2/2: 1 endpoints [Repos]"));
    }

    #[test]
    fn test_render_merged_lists_methods_and_empty_buckets() {
        colored::control::set_override(false);
        let mut listed = ExtractedEndpoint::new("Users", "GET", "/users");
        listed.description = "List users".into();
        let merged = MergedOutput {
            categories: vec![
                MergedCategory {
                    name: "Users".into(),
                    description: "User accounts".into(),
                    endpoints: vec![listed, ExtractedEndpoint::new("Users", "", "/users/{id}")],
                },
                MergedCategory {
                    name: "Repos".into(),
                    description: String::new(),
                    endpoints: Vec::new(),
                },
            ],
        };

        let text = render_merged(&merged);
        assert!(text.contains("Users (2)"));
        assert!(text.contains("  User accounts\n"));
        assert!(text.contains("  GET     /users  List users"));
        assert!(text.contains("  ?       /users/{id}"));
        assert!(text.contains("Repos (0)\n  (no endpoints extracted)\n"));
        assert!(text.ends_with('\n'));
    }
}
