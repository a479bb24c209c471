//! Parsing of one `/list/<category>/new` listing page.
//!
//! A listing page carries a navigation list whose `item<N>` links mark the
//! boundary of today's genuinely new submissions; entries at or past the
//! last marker are older cross-lists and replacements shown for context.
//! Each paper is a `<dt>` (links, item anchor) with a following `<dd>`
//! (detail block including the subjects line).

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use arxivdigest_shared::PaperRecord;

use crate::category::{extract_category_code, primary_subject_fragment};

static NAV_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#dlpage ul li a").expect("valid selector"));

static ENTRY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl dt").expect("valid selector"));

static ITEM_NAME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[name^='item']").expect("valid selector"));

static ABSTRACT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[title='Abstract']").expect("valid selector"));

/// Parse the trailing integer of an `item<N>` marker, cutting the tail at
/// the first `,` or `&` suffix. `None` when no integer can be read.
fn parse_item_index(raw: &str) -> Option<u64> {
    let tail = raw.rsplit("item").next()?;
    let tail = tail.split([',', '&']).next().unwrap_or(tail);
    tail.parse().ok()
}

/// Scan the page's navigation list for `item<N>` boundary markers.
///
/// Returns the parsed indices in document order. Unparsable candidates are
/// logged and skipped; an empty result disables index-based filtering.
pub fn extract_anchors(doc: &Html) -> Vec<u64> {
    let mut anchors = Vec::new();

    for link in doc.select(&NAV_LINK_SEL) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains("item") {
            continue;
        }
        match parse_item_index(href) {
            Some(n) => anchors.push(n),
            None => warn!(href, "could not parse anchor index from href"),
        }
    }

    if anchors.is_empty() {
        debug!("no anchors found on listing page");
    }

    anchors
}

/// Parse a listing page into identity records for the target categories.
///
/// An entry is kept iff its item index is below the page's last anchor
/// (or no anchors exist), a category code was extracted from its subjects
/// line, and that code is in `targets` (exact match). Every rejection is
/// logged with its reason; no entry failure aborts the page.
pub fn parse_listing(doc: &Html, targets: &[String]) -> Vec<PaperRecord> {
    let anchors = extract_anchors(doc);
    let mut records = Vec::new();

    let entries: Vec<ElementRef<'_>> = doc.select(&ENTRY_SEL).collect();
    if entries.is_empty() {
        info!("no paper entries on listing page");
        return records;
    }

    for dt in entries {
        if let Some(&last_anchor) = anchors.last() {
            let name_attr = dt
                .select(&ITEM_NAME_SEL)
                .next()
                .and_then(|a| a.value().attr("name"));

            match name_attr {
                Some(name) => match parse_item_index(name) {
                    Some(index) if index >= last_anchor => {
                        debug!(index, last_anchor, "entry past new-submissions boundary");
                        continue;
                    }
                    Some(_) => {}
                    None => {
                        warn!(name, "could not parse item index for entry, skipping");
                        continue;
                    }
                },
                None => {
                    warn!("listing entry has no item anchor name");
                }
            }
        }

        let Some(id) = abstract_id(&dt) else {
            warn!("listing entry has no abstract link, skipping");
            continue;
        };

        let Some(dd) = detail_block(&dt) else {
            warn!(paper_id = %id, "no detail block found for entry, skipping");
            continue;
        };

        let fragment = primary_subject_fragment(&dd);
        let Some(code) = fragment.as_deref().and_then(extract_category_code) else {
            warn!(
                paper_id = %id,
                fragment = fragment.as_deref().unwrap_or(""),
                "could not extract a primary category, skipping"
            );
            continue;
        };

        if !targets.iter().any(|t| t == &code) {
            info!(paper_id = %id, category = %code, "category not in target set, skipping");
            continue;
        }

        debug!(paper_id = %id, category = %code, "entry accepted");
        records.push(PaperRecord { id });
    }

    records
}

/// The paper id from the entry's abstract link: the trailing path segment
/// of the `a[title=Abstract]` href.
fn abstract_id(dt: &ElementRef<'_>) -> Option<String> {
    let href = dt
        .select(&ABSTRACT_LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))?;

    let id = href.rsplit('/').next().unwrap_or(href);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// The first `<dd>` following the entry's `<dt>`.
fn detail_block<'a>(dt: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    fn entry(item: u64, id: &str, subject: &str) -> String {
        format!(
            r#"<dt>
                <a name="item{item}">[{item}]</a>
                <a href="/abs/{id}" title="Abstract">arXiv:{id}</a>
            </dt>
            <dd>
                <div class="list-subjects">
                    <span class="descriptor">Subjects:</span>
                    <span class="primary-subject">{subject}</span>
                </div>
            </dd>"#
        )
    }

    fn page(nav: &str, body: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><body><div id="dlpage">
                <ul>{nav}</ul>
                <dl>{body}</dl>
            </div></body></html>"#
        ))
    }

    #[test]
    fn anchors_parsed_from_nav_links() {
        let doc = page(
            r#"<li><a href="/list/cs.CL/new#item5">New</a></li>
               <li><a href="/list/cs.CL/new#item12">Cross</a></li>
               <li><a href="/list/cs.CL/new#item20,skip">Repl</a></li>"#,
            "",
        );
        assert_eq!(extract_anchors(&doc), vec![5, 12, 20]);
    }

    #[test]
    fn malformed_anchor_skipped_not_fatal() {
        let doc = page(
            r#"<li><a href="/list/cs.CL/new#item5">New</a></li>
               <li><a href="/list/cs.CL/new#itemfoo">Bad</a></li>
               <li><a href="/list/cs.CL/new#item9&rest">Ok</a></li>"#,
            "",
        );
        assert_eq!(extract_anchors(&doc), vec![5, 9]);
    }

    #[test]
    fn no_anchors_on_plain_page() {
        let doc = page(r#"<li><a href="/help">Help</a></li>"#, "");
        assert!(extract_anchors(&doc).is_empty());
    }

    #[test]
    fn entry_past_last_anchor_excluded() {
        let body = [
            entry(1, "2301.00001", "Computation and Language (cs.CL)"),
            entry(25, "2301.00025", "Computation and Language (cs.CL)"),
        ]
        .join("\n");
        let doc = page(
            r##"<li><a href="#item5">a</a></li>
               <li><a href="#item12">b</a></li>
               <li><a href="#item20">c</a></li>"##,
            &body,
        );

        let records = parse_listing(&doc, &targets(&["cs.CL"]));
        assert_eq!(
            records,
            vec![PaperRecord {
                id: "2301.00001".into()
            }]
        );
    }

    #[test]
    fn no_anchors_means_no_index_filtering() {
        let body = entry(42, "2301.00042", "Computation and Language (cs.CL)");
        let doc = page("", &body);

        let records = parse_listing(&doc, &targets(&["cs.CL"]));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn category_mismatch_rejected() {
        let body = entry(1, "2301.00001", "Computer Vision (cs.CV)");
        let doc = page("", &body);

        assert!(parse_listing(&doc, &targets(&["cs.CL"])).is_empty());
    }

    #[test]
    fn category_match_is_case_sensitive() {
        let body = entry(1, "2301.00001", "Computation and Language (cs.CL)");
        let doc = page("", &body);

        assert!(parse_listing(&doc, &targets(&["cs.cl"])).is_empty());
        assert_eq!(parse_listing(&doc, &targets(&["cs.CL"])).len(), 1);
    }

    #[test]
    fn entry_without_abstract_link_skipped() {
        let body = r#"<dt><a name="item1">[1]</a></dt>
            <dd><div class="list-subjects">
                <span class="primary-subject">Computation and Language (cs.CL)</span>
            </div></dd>"#;
        let doc = page("", body);

        assert!(parse_listing(&doc, &targets(&["cs.CL"])).is_empty());
    }

    #[test]
    fn entry_without_detail_block_skipped() {
        let body = r#"<dt>
            <a name="item1">[1]</a>
            <a href="/abs/2301.00001" title="Abstract">arXiv:2301.00001</a>
        </dt>"#;
        let doc = page("", body);

        assert!(parse_listing(&doc, &targets(&["cs.CL"])).is_empty());
    }

    #[test]
    fn entry_with_unextractable_category_skipped() {
        let body = entry(1, "2301.00001", "Mysterious Prose Only");
        let doc = page("", &body);

        assert!(parse_listing(&doc, &targets(&["cs.CL"])).is_empty());
    }

    #[test]
    fn empty_page_is_normal_empty_result() {
        let doc = page("", "");
        assert!(parse_listing(&doc, &targets(&["cs.CL"])).is_empty());
    }

    #[test]
    fn fallback_subjects_text_used_when_no_primary_span() {
        let body = r#"<dt>
                <a name="item1">[1]</a>
                <a href="/abs/2301.00001" title="Abstract">arXiv:2301.00001</a>
            </dt>
            <dd>
                <div class="list-subjects">Subjects: Computation and Language (cs.CL); Machine Learning (cs.LG)</div>
            </dd>"#;
        let doc = page("", body);

        let records = parse_listing(&doc, &targets(&["cs.CL"]));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn records_emitted_in_page_order() {
        let body = [
            entry(1, "2301.00001", "Computation and Language (cs.CL)"),
            entry(2, "2301.00002", "Computer Vision (cs.CV)"),
            entry(3, "2301.00003", "Computation and Language (cs.CL)"),
        ]
        .join("\n");
        let doc = page("", &body);

        let ids: Vec<String> = parse_listing(&doc, &targets(&["cs.CL"]))
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["2301.00001", "2301.00003"]);
    }

    #[test]
    fn parse_item_index_handles_suffixes() {
        assert_eq!(parse_item_index("/list/cs.CL/new#item17"), Some(17));
        assert_eq!(parse_item_index("item4,rest"), Some(4));
        assert_eq!(parse_item_index("item8&other=1"), Some(8));
        assert_eq!(parse_item_index("item"), None);
        assert_eq!(parse_item_index("itemX"), None);
    }
}
