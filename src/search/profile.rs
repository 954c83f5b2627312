use crate::persona;

/// Canned profile block, offered only when the query is about the subject.
pub(super) fn contextual_results(query: &str) -> Option<&'static str> {
    let query = query.to_lowercase();
    persona::SUBJECT_TERMS
        .iter()
        .any(|term| query.contains(term))
        .then_some(persona::CONTEXTUAL_RESULTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_subject_name_case_insensitively() {
        assert!(contextual_results("Projects by DINMAY").is_some());
        assert!(contextual_results("brahma's research").is_some());
        assert!(contextual_results("rust async runtimes").is_none());
    }

    #[test]
    fn degraded_notice_names_the_query() {
        let notice = persona::degraded_results("rust async runtimes");
        assert!(notice.contains("**Search attempted for:** rust async runtimes"));
        assert!(notice.contains("IIT Guwahati"));
    }
}
