//! Filtering, sorting and paging shared by the list queries.

use chrono::{DateTime, Utc};
use db::models::values::{ValueError, parse_variant};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::config::PaginationConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Raw sort and page parameters, as they arrive in a query string.
#[derive(Debug, Clone, Default)]
pub struct ListParams<'a> {
    pub sort_by: Option<&'a str>,
    pub direction: Option<&'a str>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listing {
    pub sort_by: SortField,
    pub direction: SortDirection,
    pub page: u32,
    pub per_page: u32,
}

impl ListParams<'_> {
    pub fn resolve(&self, limits: PaginationConfig) -> Result<Listing, ValueError> {
        let sort_by = self
            .sort_by
            .map(|raw| parse_variant::<SortField>("sort_by", raw))
            .transpose()?
            .unwrap_or_default();
        let direction = self
            .direction
            .map(|raw| parse_variant::<SortDirection>("direction", raw))
            .transpose()?
            .unwrap_or_default();
        let per_page = self
            .per_page
            .unwrap_or(limits.default_page_size)
            .clamp(1, limits.max_page_size.max(1));
        Ok(Listing {
            sort_by,
            direction,
            page: self.page.unwrap_or(1).max(1),
            per_page,
        })
    }
}

/// Fields a view exposes for sorting.
pub trait Sortable {
    fn sort_name(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl Listing {
    /// Sort and cut one page out of already-filtered items.
    pub fn apply<T: Sortable>(&self, mut items: Vec<T>) -> Paginated<T> {
        items.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortField::Name => a
                    .sort_name()
                    .to_lowercase()
                    .cmp(&b.sort_name().to_lowercase()),
                SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
                SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = items.len() as u64;
        let total_pages = total.div_ceil(self.per_page as u64) as u32;
        let start = ((self.page - 1) as usize).saturating_mul(self.per_page as usize);
        let items = items
            .into_iter()
            .skip(start)
            .take(self.per_page as usize)
            .collect();

        Paginated {
            items,
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages,
        }
    }
}

/// Case-insensitive substring match; `None` matches everything.
pub fn name_matches(name: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Parse an optional enum filter from the query string.
pub fn parse_filter<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ValueError> {
    raw.filter(|r| !r.trim().is_empty())
        .map(|r| parse_variant(field, r))
        .transpose()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        name: &'static str,
        created_at: DateTime<Utc>,
    }

    impl Sortable for Item {
        fn sort_name(&self) -> &str {
            self.name
        }
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
        fn updated_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn items() -> Vec<Item> {
        let now = Utc::now();
        vec![
            Item { name: "carrot", created_at: now },
            Item { name: "Basil", created_at: now - Duration::minutes(5) },
            Item { name: "apple", created_at: now - Duration::minutes(10) },
        ]
    }

    #[test]
    fn defaults_sort_by_creation_ascending() {
        let listing = ListParams::default()
            .resolve(PaginationConfig::default())
            .unwrap();
        let page = listing.apply(items());
        let names: Vec<_> = page.items.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["apple", "Basil", "carrot"]);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn name_sort_is_case_insensitive_and_reversible() {
        let listing = ListParams {
            sort_by: Some("name"),
            direction: Some("desc"),
            ..Default::default()
        }
        .resolve(PaginationConfig::default())
        .unwrap();
        let names: Vec<_> = listing.apply(items()).items.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["carrot", "Basil", "apple"]);
    }

    #[test]
    fn paging_clamps_and_slices() {
        let listing = ListParams {
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        }
        .resolve(PaginationConfig::default())
        .unwrap();
        let page = listing.apply(items());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 2);

        let limits = PaginationConfig {
            default_page_size: 20,
            max_page_size: 50,
        };
        let clamped = ListParams {
            per_page: Some(10_000),
            page: Some(0),
            ..Default::default()
        }
        .resolve(limits)
        .unwrap();
        assert_eq!(clamped.per_page, 50);
        assert_eq!(clamped.page, 1);
    }

    #[test]
    fn unknown_sort_field_is_a_validation_error() {
        let err = ListParams {
            sort_by: Some("colour"),
            ..Default::default()
        }
        .resolve(PaginationConfig::default())
        .unwrap_err();
        assert!(matches!(err, ValueError::UnknownVariant { field: "sort_by", .. }));
    }

    #[test]
    fn name_matching_ignores_case_and_blank_needles() {
        assert!(name_matches("Cherry Tomato", Some("tomato")));
        assert!(name_matches("Cherry Tomato", Some("  ")));
        assert!(!name_matches("Basil", Some("mint")));
    }
}
