//! Paper template loading and substitution.
//!
//! Templates are plain markdown with `{placeholder}` markers filled by
//! simple string substitution; unknown markers are left untouched.

use std::path::Path;

use arxivdigest_shared::{ArxivDigestError, EnhancedPaper, Result};

/// Built-in paper template, used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "\
### [{idx}] [{title}]({url})

*{authors}*

Main category: {cate}

> **TL;DR**: {tldr}

- **Motivation**: {motivation}
- **Method**: {method}
- **Result**: {result}
- **Conclusion**: {conclusion}

<details>
<summary>Abstract</summary>

{summary}

</details>

{assistant_link_markdown}
";

/// Load a template from a file.
pub fn load_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ArxivDigestError::io(path, e))
}

/// Fill one paper into the template.
pub fn render_paper(
    template: &str,
    paper: &EnhancedPaper,
    idx: usize,
    assistant_link_markdown: &str,
) -> String {
    let meta = &paper.meta;
    let ai = &paper.ai;

    template
        .replace("{idx}", &idx.to_string())
        .replace("{title}", &meta.title)
        .replace("{authors}", &meta.authors.join(", "))
        .replace("{summary}", &meta.summary)
        .replace("{url}", &meta.abs)
        .replace("{cate}", meta.primary_category().unwrap_or("N/A"))
        .replace("{tldr}", &ai.tldr)
        .replace("{motivation}", &ai.motivation)
        .replace("{method}", &ai.method)
        .replace("{result}", &ai.result)
        .replace("{conclusion}", &ai.conclusion)
        .replace("{assistant_link_markdown}", assistant_link_markdown)
}
