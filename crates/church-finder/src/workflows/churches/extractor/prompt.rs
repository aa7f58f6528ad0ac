use super::super::dedup::CrawlPage;
use super::super::domain::Badge;

/// Per-page content cap, in characters, before the page is sent for extraction.
pub const MAX_PAGE_CHARS: usize = 4000;

pub(crate) const DOCTRINAL_STATEMENT: &str = "# Calvinist Parrot Doctrinal Statement

## Core Doctrines
- The Trinity: We believe in one God, eternally existing in three persons: Father, Son, and Holy Spirit.
- The Gospel: We proclaim that salvation is secured by Christ's historical death, burial, and resurrection on the third day, demonstrating His victory over sin and death.
- Justification by Faith: Individuals are justified solely by grace alone through faith alone in Christ alone, apart from works.
- The Deity and Humanity of Christ: We affirm that Jesus Christ is truly God and truly man (Vera Deus, vera homo).
- The Authority of Scripture: The Bible is the inspired, inerrant, and infallible Word of God, serving as the ultimate authority in all matters of faith and practice.
- The Incarnation and Virgin Birth: We affirm that Jesus Christ took on human nature through miraculous conception by the Holy Spirit and was born of the Virgin Mary.
- The Atonement (Christ's Saving Work): Christ's sacrificial death on the cross is necessary and sufficient to reconcile sinners to God.
- The Resurrection: We affirm the bodily resurrection of Jesus Christ, confirming His divinity and victory over sin and death.
- Christ's Return and Final Judgment: Jesus Christ will return personally and bodily to judge the living and the dead, culminating in the renewal of all things.
- The Character of God: God is holy, supreme, sovereign, immutable, faithful, good, patient, gracious, merciful, loving, and just; His wrath against sin is real.

## Secondary Doctrines
- Baptism, Church Governance, The Lord's Supper, Spiritual Gifts, Role of Women in the Church, Sanctification, Continuity and Discontinuity, Security of Salvation, The Atonement (How it Works).

## Tertiary Doctrines
- Eschatology, Worship Style, Counseling Approaches, Creation, Christian Liberty, Church Discipline, Parachurch Organizations, Non-essential doctrines.

In all doctrinal matters we uphold unity in essentials, liberty in non-essentials, and charity in all things.";

const ANALYST_ROLE: &str = "You are a research analyst helping Calvinist Parrot Ministries vet churches. Produce precise, source-grounded JSON according to the schema.";

const EXTRACTION_RULES: &str = "Extract doctrinal data and metadata about the church according to the provided JSON schema. Follow these critical rules:

1. Only rely on the supplied pages. Never fabricate facts.
2. Prefer explicit affirmations (\"we believe\", \"we affirm\") for every doctrine. If a doctrine is not clearly affirmed or denied, mark it as \"unknown\".
3. For the core doctrines, use the values \"true\", \"false\", or \"unknown\" only. If the church adopts one of the allowed historic confessions (Westminster, 1644 LBCF, 1689 LBCF, Belgic/Heidelberg/Dort, Helvetic, Irish Articles, Savoy, Thirty-Nine Articles), set confession.adopted=true, include the confession name and source URL, and add the note \"Essentials inferred from adopted confession (1689 LBCF); not listed individually on this page.\" (adjust the confession name appropriately).
4. If confession.adopted=true, set all core doctrines to \"true\" unless the site explicitly denies a doctrine. Do not infer denials.
5. Populate secondary and tertiary doctrine fields with concise phrases when explicitly stated. Otherwise use null.
6. Include short (<=30 word) quotes as notes with their source URL when possible.
7. Populate best_pages_for with the single best URL for each category.
8. Set badges only from the allowed list.
9. Return null for any missing string field and [] for missing arrays.
10. Ensure the JSON strictly conforms to the schema.";

/// Chat messages sent to the extraction model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPrompt {
    pub system: String,
    pub user: String,
}

impl ExtractionPrompt {
    pub fn for_pages(pages: &[CrawlPage]) -> Self {
        let allowed = Badge::ALL
            .iter()
            .map(|badge| format!("- {}", badge.label()))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            system: format!("{DOCTRINAL_STATEMENT}\n\n{ANALYST_ROLE}"),
            user: format!(
                "{EXTRACTION_RULES}\n\nAllowed badges:\n{allowed}\n\n{}",
                render_page_blocks(pages)
            ),
        }
    }
}

/// Render pages as numbered blocks, each capped at [`MAX_PAGE_CHARS`].
pub fn render_page_blocks(pages: &[CrawlPage]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            let url = if page.url.trim().is_empty() {
                "Unknown URL"
            } else {
                page.url.as_str()
            };
            format!(
                "### Page {}\nURL: {}\n--------------------\n{}",
                index + 1,
                url,
                truncate_content(&page.raw_content, MAX_PAGE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cut `content` to `max_chars` characters, marking the cut with `…`.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}…", &content[..byte_index]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("abcdef", 6), "abcdef");
        assert_eq!(truncate_content("abcdef", 3), "abc…");
        assert_eq!(truncate_content("Grâce à Dieu", 5), "Grâce…");
    }

    #[test]
    fn page_blocks_are_numbered_from_one() {
        let pages = vec![
            CrawlPage::new("https://gracechurch.example/", "Welcome"),
            CrawlPage::new("", "x".repeat(MAX_PAGE_CHARS + 5)),
        ];

        let rendered = render_page_blocks(&pages);
        let blocks: Vec<&str> = rendered.split("\n\n").collect();

        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            "### Page 1\nURL: https://gracechurch.example/\n--------------------\nWelcome"
        );
        assert!(blocks[1].starts_with("### Page 2\nURL: Unknown URL\n"));
        assert!(blocks[1].ends_with('…'));
    }

    #[test]
    fn prompt_lists_every_allowed_badge() {
        let prompt = ExtractionPrompt::for_pages(&[CrawlPage::new("https://a.example/", "A")]);
        assert!(prompt.system.starts_with("# Calvinist Parrot Doctrinal Statement"));
        assert!(prompt.system.ends_with(ANALYST_ROLE));
        for badge in Badge::ALL {
            assert!(prompt.user.contains(badge.label()), "{badge:?}");
        }
        assert!(prompt.user.ends_with("### Page 1\nURL: https://a.example/\n--------------------\nA"));
    }
}
