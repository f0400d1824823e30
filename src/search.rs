use serde::Deserialize;

use crate::record::Record;
use crate::translit;

/// Canonical comparable form of a string: lowercase, with every whitespace
/// character and every `-` removed.
///
/// Scripts without case (Devanagari) only lose their whitespace and hyphens.
pub fn normalize(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| !is_ignored(*c)).collect()
}

// U+FEFF is not `char::is_whitespace` but turns up in pasted text.
fn is_ignored(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '\u{feff}')
}

/// `None` when nothing comparable is left, so a query of only spaces or
/// hyphens never matches every record.
pub fn normalize_query(query: &str) -> Option<String> {
    let needle = normalize(query);
    (!needle.is_empty()).then_some(needle)
}

/// Record fields that can take part in a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    FullName,
    Surname,
    RelationName,
    HouseNo,
    Id,
}

impl SearchField {
    pub const ALL: [SearchField; 5] = [
        SearchField::FullName,
        SearchField::Surname,
        SearchField::RelationName,
        SearchField::HouseNo,
        SearchField::Id,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SearchField::FullName => "full_name",
            SearchField::Surname => "surname",
            SearchField::RelationName => "relation_name",
            SearchField::HouseNo => "house_no",
            SearchField::Id => "id",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn value(self, record: &Record) -> &str {
        match self {
            SearchField::FullName => &record.full_name,
            SearchField::Surname => &record.surname,
            SearchField::RelationName => &record.relation_name,
            SearchField::HouseNo => &record.house_no,
            SearchField::Id => &record.id,
        }
    }
}

pub fn default_fields() -> Vec<SearchField> {
    vec![
        SearchField::FullName,
        SearchField::RelationName,
        SearchField::HouseNo,
        SearchField::Id,
    ]
}

/// Which fields are searched and how they are compared.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub fields: Vec<SearchField>,
    /// Also compare against a Latin transliteration of each field.
    pub transliterate: bool,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            transliterate: false,
        }
    }
}

impl Matcher {
    /// `needle` must already be normalized.
    pub fn matches(&self, record: &Record, needle: &str) -> bool {
        self.fields.iter().any(|field| {
            let value = field.value(record);
            if normalize(value).contains(needle) {
                return true;
            }
            self.transliterate
                && translit::needs_transliteration(value)
                && normalize(&translit::transliterate(value)).contains(needle)
        })
    }

    /// Positions of the matching records, in store order.
    pub fn filter_indices(&self, records: &[Record], query: &str) -> Vec<usize> {
        let Some(needle) = normalize_query(query) else {
            return Vec::new();
        };
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record, &needle))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched<'r>(matcher: &Matcher, records: &'r [Record], query: &str) -> Vec<&'r Record> {
        matcher
            .filter_indices(records, query)
            .into_iter()
            .map(|idx| &records[idx])
            .collect()
    }

    fn filter<'r>(records: &'r [Record], query: &str, fields: &[SearchField]) -> Vec<&'r Record> {
        let matcher = Matcher {
            fields: fields.to_vec(),
            transliterate: false,
        };
        matched(&matcher, records, query)
    }

    fn jane() -> Record {
        Record {
            serial_no: 1,
            id: "A1".into(),
            full_name: "Jane Doe".into(),
            relation_name: "John Doe".into(),
            relation_type: "Husband".into(),
            house_no: "12-B".into(),
            age: 40,
            gender: "F".into(),
            ..Record::default()
        }
    }

    fn record(id: &str, name: &str, house: &str) -> Record {
        Record {
            id: id.into(),
            full_name: name.into(),
            house_no: house.into(),
            ..Record::default()
        }
    }

    #[test]
    fn normalize_strips_case_whitespace_and_hyphens() {
        assert_eq!(normalize("  Jane\tDoe "), "janedoe");
        assert_eq!(normalize("12-B"), "12b");
        assert_eq!(normalize("o brien"), normalize("O-Brien"));
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("राम  पाटील"), "रामपाटील");
        assert_eq!(normalize("\u{feff}Jane\u{feff}Doe"), "janedoe");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["Jane Doe", " 12 - B ", "", "राम-पाटील", "ÉCOLE\u{a0}Ü", "---"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn normalize_query_rejects_blank() {
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("   \t"), None);
        assert_eq!(normalize_query(" Jane "), Some("jane".into()));
        assert_eq!(normalize_query("-"), None);
        assert_eq!(normalize_query(" - "), None);
        assert_eq!(normalize_query("--\u{feff}"), None);
    }

    #[test]
    fn single_record_scenario() {
        let store = vec![jane()];
        let fields = default_fields();
        assert_eq!(filter(&store, "jane", &fields).len(), 1);
        assert_eq!(filter(&store, "12b", &fields).len(), 1);
        assert!(filter(&store, "xyz", &fields).is_empty());
        let matcher = Matcher::default();
        assert_eq!(matcher.filter_indices(&store, "DOE"), vec![0]);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let store = vec![jane()];
        assert!(filter(&store, "", &default_fields()).is_empty());
        assert!(filter(&store, "   ", &default_fields()).is_empty());
    }

    #[test]
    fn hyphen_only_query_matches_nothing() {
        let store = vec![jane(), record("A2", "Asha Patil", "4")];
        assert!(filter(&store, "  - ", &default_fields()).is_empty());
        assert!(filter(&store, "---", &default_fields()).is_empty());
        assert!(Matcher::default().filter_indices(&store, "-").is_empty());
    }

    #[test]
    fn empty_store_matches_nothing() {
        assert!(filter(&[], "jane", &default_fields()).is_empty());
    }

    #[test]
    fn results_preserve_store_order() {
        let store = vec![
            record("3", "Asha Patil", "1"),
            record("1", "Ravi Kale", "2"),
            record("2", "Sunita Patil", "3"),
            record("4", "Patil Vijay", "4"),
        ];
        let ids: Vec<&str> = filter(&store, "patil", &default_fields())
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "2", "4"]);
    }

    #[test]
    fn every_result_matches_a_designated_field() {
        let store = vec![
            record("X-1", "Asha", "7"),
            record("X2", "Ravi", "x-7"),
            record("Y3", "Maxine", "9"),
        ];
        let fields = vec![SearchField::HouseNo, SearchField::Id];
        let needle = normalize("x 7");
        let results = filter(&store, "x 7", &fields);
        assert_eq!(results.len(), 1);
        for r in results {
            assert!(fields.iter().any(|f| normalize(f.value(r)).contains(&needle)));
        }
    }

    #[test]
    fn undesignated_fields_are_ignored() {
        let store = vec![jane()];
        assert!(filter(&store, "husband", &default_fields()).is_empty());
        assert!(filter(&store, "doe", &[SearchField::Id]).is_empty());
    }

    #[test]
    fn surname_field_is_searchable() {
        let mut r = record("A1", "Jane", "1");
        r.surname = "Deshmukh".into();
        let store = vec![r];
        assert_eq!(filter(&store, "desh", &[SearchField::Surname]).len(), 1);
        assert!(filter(&store, "desh", &[SearchField::FullName]).is_empty());
    }

    #[test]
    fn transliteration_is_opt_in() {
        let store = vec![record("M1", "राम पाटील", "5")];
        let latin = normalize(&translit::transliterate("राम पाटील"));
        assert!(latin.is_ascii() && latin.len() >= 3, "got {latin}");
        let query = &latin[..3];

        let plain = Matcher::default();
        assert!(matched(&plain, &store, query).is_empty());

        let mut translit = Matcher::default();
        translit.transliterate = true;
        assert_eq!(matched(&translit, &store, query).len(), 1);
        assert_eq!(matched(&translit, &store, "पाटील").len(), 1);
    }

    #[test]
    fn field_keys_round_trip() {
        for field in SearchField::ALL {
            assert_eq!(SearchField::from_key(field.key()), Some(field));
        }
        assert_eq!(SearchField::from_key("HOUSE_NO"), Some(SearchField::HouseNo));
        assert_eq!(SearchField::from_key("phone"), None);
    }
}
