/// One mark per `char` of `text`. Matches of a single filter never overlap.
pub fn match_mask(text: &str, filters: &[String]) -> Vec<bool> {
    let haystack: Vec<char> = text.chars().map(fold).collect();
    let mut mask = vec![false; haystack.len()];
    for filter in filters {
        let needle: Vec<char> = filter.chars().map(fold).collect();
        if needle.is_empty() || needle.len() > haystack.len() {
            continue;
        }
        let mut index = 0;
        while index + needle.len() <= haystack.len() {
            if haystack[index..index + needle.len()] == needle[..] {
                mask[index..index + needle.len()].fill(true);
                index += needle.len();
            } else {
                index += 1;
            }
        }
    }
    mask
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

pub fn segments(text: &str, mask: &[bool]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for (ch, &matched) in text.chars().zip(mask.iter().chain(std::iter::repeat(&false))) {
        match segments.last_mut() {
            Some(last) if last.matched == matched => last.text.push(ch),
            _ => segments.push(Segment {
                text: ch.to_string(),
                matched,
            }),
        }
    }
    segments
}

// Scalar-to-scalar folding keeps mask positions aligned with the input.
fn fold(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn marks_case_insensitive_spans() {
        let text = "MyFileNameTEST";
        let mask = match_mask(text, &filters(&["file", "test"]));
        let mut marked = String::new();
        let mut unmarked = String::new();
        for (ch, flag) in text.chars().zip(mask) {
            if flag {
                marked.push(ch);
            } else {
                unmarked.push(ch);
            }
        }
        assert_eq!(marked, "FileTEST");
        assert_eq!(unmarked, "MyName");
    }

    #[test]
    fn scan_skips_past_each_match() {
        let mask = match_mask("aaa", &filters(&["aa"]));
        assert_eq!(mask, vec![true, true, false]);
    }

    #[test]
    fn overlapping_filters_union_their_marks() {
        let mask = match_mask("abcd", &filters(&["abc", "bcd"]));
        assert_eq!(mask, vec![true; 4]);
    }

    #[test]
    fn empty_filters_mark_nothing() {
        let mask = match_mask("abc", &filters(&["", "zz"]));
        assert_eq!(mask, vec![false; 3]);
        assert_eq!(match_mask("abc", &[]), vec![false; 3]);
    }

    #[test]
    fn segments_are_maximal_runs() {
        let text = "MyFileNameTEST";
        let mask = match_mask(text, &filters(&["file", "test"]));
        let segments = segments(text, &mask);
        let parts: Vec<(&str, bool)> = segments
            .iter()
            .map(|segment| (segment.text.as_str(), segment.matched))
            .collect();
        assert_eq!(
            parts,
            vec![("My", false), ("File", true), ("Name", false), ("TEST", true)]
        );
    }
}
