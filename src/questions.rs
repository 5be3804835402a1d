// src/questions.rs

/// Split `text` on `.` and keep the trimmed fragments that contain a `?`.
///
/// Segmentation is deliberately naive: only periods delimit fragments, so
/// several questions joined by `!` or `?` come back as one element, and an
/// abbreviation such as "e.g." cuts a question in two.
pub fn extract_questions(text: &str) -> Vec<String> {
    text.split('.')
        .filter(|fragment| fragment.contains('?'))
        .map(|fragment| fragment.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "
I recently completed my AWS certification! What is the best way to get a cloud computing job?
Also, how can I network better with recruiters?
";

    fn fragment_count(text: &str) -> usize {
        text.split('.').count()
    }

    #[test]
    fn test_no_period_keeps_whole_text() {
        let text = "I got certified! What is the best job? How do I network?";
        assert_eq!(extract_questions(text), vec![text.to_string()]);
    }

    #[test]
    fn test_sample_post_is_a_single_fragment() {
        let questions = extract_questions(POST);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].starts_with("I recently completed"));
        assert!(questions[0].ends_with("recruiters?"));
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_questions("").is_empty());
    }

    #[test]
    fn test_no_question_mark() {
        assert!(extract_questions("Hired. Started Monday. Loving it.").is_empty());
    }

    #[test]
    fn test_every_fragment_is_a_question() {
        let text = "Why? How? When?";
        assert_eq!(extract_questions(text).len(), fragment_count(text));

        let text = "Why?. How?. When?";
        assert_eq!(extract_questions(text), vec!["Why?", "How?", "When?"]);
    }

    #[test]
    fn test_order_and_trimming() {
        let text = "  Intro.  First one?  . Filler. \tSecond one?\n";
        assert_eq!(extract_questions(text), vec!["First one?", "Second one?"]);
    }

    #[test]
    fn test_abbreviation_splits_question() {
        let text = "Which cloud, e.g. AWS or GCP, pays best?";
        assert_eq!(extract_questions(text), vec!["AWS or GCP, pays best?"]);
    }

    #[test]
    fn test_properties_hold_on_varied_inputs() {
        let inputs = [
            "",
            ".",
            "?",
            "...???",
            "a? b. c? d.",
            "No questions here. None at all",
            "  spaced ?  .  out  ?  ",
            "Ünïcödé? Ça va. Qué tal?",
            POST,
        ];

        for input in inputs {
            let first = extract_questions(input);
            assert!(first.len() <= fragment_count(input), "{input:?}");
            for q in &first {
                assert!(q.contains('?'), "{input:?}");
                assert_eq!(q, q.trim(), "{input:?}");
            }

            let mut cursor = 0;
            for q in &first {
                let found = input[cursor..].find(q.as_str()).expect("fragment in order");
                cursor += found + q.len();
            }

            assert_eq!(first, extract_questions(input));
        }
    }
}
