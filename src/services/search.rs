use nucleo_matcher::{
    pattern::{CaseMatching, Normalization, Pattern},
    Matcher,
};

use crate::data::Label;

/// Filter repository labels using fuzzy matching on name and description.
/// Returns the indices of matching labels, best match first.
pub fn filter_labels(labels: &[Label], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..labels.len()).collect();
    }

    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);

    let haystacks: Vec<String> = labels
        .iter()
        .map(|label| match &label.description {
            Some(desc) => format!("{} {}", label.name, desc),
            None => label.name.clone(),
        })
        .collect();

    // Score by position so duplicate haystacks keep distinct indices
    let mut scored: Vec<(usize, u32)> = haystacks
        .iter()
        .enumerate()
        .filter_map(|(idx, haystack)| {
            let mut buf = Vec::new();
            let utf32 = nucleo_matcher::Utf32Str::new(haystack, &mut buf);
            pattern.score(utf32, &mut matcher).map(|score| (idx, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(idx, _)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, description: Option<&str>) -> Label {
        Label {
            id: 0,
            name: name.to_string(),
            color: "ededed".to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let labels = vec![label("bug", None), label("docs", None)];
        assert_eq!(filter_labels(&labels, ""), vec![0, 1]);
    }

    #[test]
    fn fuzzy_query_narrows_the_list() {
        let labels = vec![
            label("bug", Some("Something isn't working")),
            label("documentation", None),
            label("enhancement", Some("New feature or request")),
        ];
        assert_eq!(filter_labels(&labels, "docu"), vec![1]);
        assert!(filter_labels(&labels, "feature").contains(&2));
        assert!(filter_labels(&labels, "zzzz").is_empty());
    }
}
