//! Combined prompt construction

use super::types::AnalysisKind;

/// Label of the item at 1-based `position`
pub fn item_label(position: usize) -> String {
    format!("ITEM_{}", position)
}

/// Label of the response block for 1-based `position`
pub fn analysis_label(position: usize) -> String {
    format!("ITEM_{}_ANALYSIS:", position)
}

const OUTPUT_FORMAT: &str = r#"For EACH item, respond in this EXACT format:
ITEM_X_ANALYSIS:
{"risk_level": "High|Medium|Low", "analysis": "Brief explanation"}

Replace X with the item number. Return one block per item, in order."#;

/// Build a single prompt covering `items`, labelled `ITEM_1..ITEM_n`
pub fn build_prompt<S: AsRef<str>>(kind: AnalysisKind, items: &[S]) -> String {
    let labelled = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}: {}", item_label(i + 1), item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n");

    let preamble = match kind {
        AnalysisKind::Risk => format!(
            "You are an expert risk analyzer. Analyze ALL {} of the following items in a SINGLE response.\n\
             Consider liability, financial exposure, operational constraints, compliance, \
             termination, indemnification and dispute resolution. Only mark an item Low if it is \
             truly standard and poses minimal risk.",
            items.len()
        ),
        AnalysisKind::Summary => format!(
            "You explain complex terms in simple language. Cover ALL {} of the following items in a SINGLE response.\n\
             For each item give its overall risk level and explain the main concerns in everyday \
             words, avoiding jargon.",
            items.len()
        ),
    };

    format!("{preamble}\n\n{OUTPUT_FORMAT}\n\nItems:\n{labelled}\n")
}
