use super::*;
use shared::domain::UserId;

fn record(id: &str, role: &str, first: &str, last: &str, created: &str) -> UserRecord {
    UserRecord {
        id: UserId::from(id),
        role: role.to_string(),
        created_date: created.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

#[test]
fn empty_term_matches_everything() {
    let term = SearchTerm::default();
    assert!(term.matches(&record("A1", "admin", "Ann", "Lee", "2023-01-01")));
}

#[test]
fn matches_any_searchable_field_ignoring_case() {
    let ann = record("A1", "admin", "Ann", "Lee", "2023-01-01");
    for needle in ["a1", "ADM", "nn", "lEe"] {
        assert!(SearchTerm::new(needle).matches(&ann), "{needle} should match");
    }
    assert!(!SearchTerm::new("bob").matches(&ann));
}

#[test]
fn created_date_is_not_searchable() {
    let ann = record("A1", "admin", "Ann", "Lee", "2023-01-01");
    assert!(!SearchTerm::new("2023").matches(&ann));
}

#[test]
fn set_search_resets_page_even_when_term_is_unchanged() {
    let mut search = SearchController::default();
    let mut page = PageState::default();

    page.go_to_page(4).expect("page 4");
    search.set_search("ann", &mut page);
    assert_eq!(page.current_page(), 1);

    page.go_to_page(2).expect("page 2");
    search.set_search("ann", &mut page);
    assert_eq!(page.current_page(), 1);
    assert_eq!(search.term().as_str(), "ann");
}
