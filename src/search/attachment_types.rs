//! Attachment-type, star-variant, and category inference from message parts
//! and labels, used by the `has:` and `category:` predicates.

use crate::models::MessagePart;

/// Classify a single message part into at most one attachment-type tag.
/// Ported from the reference simulator's `detect_attachment_types`: this is
/// a first-match-wins chain (not independent "any of" checks), so a part
/// that is e.g. both a PDF and an image by extension only ever gets the
/// earlier tag in this order.
pub fn detect_attachment_type(part: &MessagePart) -> Option<&'static str> {
    let filename = part.filename.to_ascii_lowercase();
    let mime = part.mime_type.to_ascii_lowercase();

    if filename.contains("youtube") || mime.contains("youtube") {
        Some("youtube")
    } else if filename.ends_with(".xlsx") || filename.ends_with(".csv") || mime.contains("spreadsheet") {
        Some("spreadsheet")
    } else if filename.ends_with(".pptx") || mime.contains("presentation") {
        Some("presentation")
    } else if filename.ends_with(".docx") || filename.ends_with(".doc") || mime.contains("document") {
        Some("document")
    } else if mime.contains("drive") {
        Some("drive")
    } else if filename.ends_with(".pdf") || mime == "application/pdf" {
        Some("pdf")
    } else if mime.starts_with("image/") {
        Some("image")
    } else if mime.starts_with("video/") {
        Some("video")
    } else if mime.starts_with("audio/") {
        Some("audio")
    } else {
        None
    }
}

/// Recognize a colored/variant star label by name, per `detect_star_types`:
/// a first-match-wins chain keyed off the presence of `star`/`bang`/etc,
/// qualified by a color substring where the original emits compound tags
/// (`red-bang`, `orange-guillemet`, `green-check`, `blue-info`,
/// `purple-question`) rather than the bare word alone.
pub fn detect_star_type(label_name: &str) -> Option<&'static str> {
    let lower = label_name.to_ascii_lowercase();
    if lower.contains("star") {
        if lower.contains("yellow_star") || lower.contains("yellow star") {
            Some("yellow-star")
        } else if lower.contains("orange_star") || lower.contains("orange star") {
            Some("orange-star")
        } else if lower.contains("red_star") || lower.contains("red star") {
            Some("red-star")
        } else if lower.contains("purple_star") || lower.contains("purple star") {
            Some("purple-star")
        } else if lower.contains("blue_star") || lower.contains("blue star") {
            Some("blue-star")
        } else if lower.contains("green_star") || lower.contains("green star") {
            Some("green-star")
        } else {
            Some("star")
        }
    } else if lower.contains("bang") {
        if lower.contains("red_bang") || lower.contains("red bang") {
            Some("red-bang")
        } else if lower.contains("yellow_bang") || lower.contains("yellow bang") {
            Some("yellow-bang")
        } else {
            None
        }
    } else if (lower.contains("guillemet") && lower.contains("orange")) || lower.contains("orange_guillemet") {
        Some("orange-guillemet")
    } else if (lower.contains("check") && lower.contains("green")) || lower.contains("green_check") {
        Some("green-check")
    } else if (lower.contains("info") && lower.contains("blue")) || lower.contains("blue_info") {
        Some("blue-info")
    } else if (lower.contains("question") && lower.contains("purple")) || lower.contains("purple_question") {
        Some("purple-question")
    } else {
        None
    }
}

pub const CATEGORIES: &[&str] = &[
    "primary",
    "social",
    "promotions",
    "updates",
    "forums",
    "reservations",
    "purchases",
];

/// Infer a message's category from its label set, in the priority order
/// used by `infer_category_from_labels`.
pub fn infer_category_from_labels(label_ids: &[String]) -> Option<&'static str> {
    let lowered: Vec<String> = label_ids.iter().map(|l| l.to_ascii_lowercase()).collect();
    let has = |needle: &str| lowered.iter().any(|l| l.contains(needle));

    if has("category_social") || has("social") {
        Some("social")
    } else if has("category_promotions") || has("promotions") {
        Some("promotions")
    } else if has("category_updates") || has("updates") {
        Some("updates")
    } else if has("category_forums") || has("forums") {
        Some("forums")
    } else if has("reservations") {
        Some("reservations")
    } else if has("purchases") {
        Some("purchases")
    } else if has("category_personal") || has("primary") || has("inbox") {
        Some("primary")
    } else {
        label_ids.iter().find_map(|l| {
            let lower = l.to_ascii_lowercase();
            let stripped = lower.strip_prefix("category_")?;
            CATEGORIES.iter().find(|c| **c == stripped).copied()
        })
    }
}
