use crate::error::AppError;
use crate::models::{FilmFormat, FilmType, FilmUnit, FormatInfo, GroupedFilm, ProductKey};
use crate::services::film_service;
use rusqlite::Connection;
use std::collections::HashMap;

/// Projects the ledger into product-level aggregates.
///
/// Pure function: the same ledger slice always yields the same aggregates,
/// including `roll_ids`. Outer groups keep first-seen (insertion) order so
/// the UI list does not jump when a row elsewhere changes.
pub fn grouped_films(units: &[FilmUnit]) -> Vec<GroupedFilm> {
    let mut key_order: Vec<ProductKey> = Vec::new();
    let mut by_key: HashMap<ProductKey, Vec<&FilmUnit>> = HashMap::new();

    for unit in units {
        let key = unit.product_key();
        by_key
            .entry(key.clone())
            .or_insert_with(|| {
                key_order.push(key);
                Vec::new()
            })
            .push(unit);
    }

    key_order
        .into_iter()
        .map(|key| {
            let rows = &by_key[&key];
            GroupedFilm {
                name: key.name,
                manufacturer: key.manufacturer,
                film_type: key.film_type,
                speed: key.speed,
                formats: format_infos(rows),
                all_expiry_dates: union_expiry_dates(rows),
            }
        })
        .collect()
}

/// Sub-partitions one product group by (format, custom name), in first-seen
/// order. Quantities sum over every contributing row; representative display
/// fields come from the first row still in stock.
fn format_infos(rows: &[&FilmUnit]) -> Vec<FormatInfo> {
    let mut format_order: Vec<FilmFormat> = Vec::new();
    let mut by_format: HashMap<FilmFormat, Vec<&FilmUnit>> = HashMap::new();

    for unit in rows {
        by_format
            .entry(unit.format.clone())
            .or_insert_with(|| {
                format_order.push(unit.format.clone());
                Vec::new()
            })
            .push(unit);
    }

    format_order
        .into_iter()
        .map(|format| {
            let contributing = &by_format[&format];
            let representative = contributing
                .iter()
                .find(|u| u.quantity > 0)
                .unwrap_or(&contributing[0]);

            FormatInfo {
                format,
                total_quantity: contributing.iter().map(|u| u.quantity).sum(),
                roll_ids: contributing.iter().map(|u| u.uuid.clone()).collect(),
                expiry_dates: representative.expiry_dates.clone(),
                is_frozen: representative.is_frozen,
                exposures: representative.exposures,
                comments: representative.comments.clone(),
            }
        })
        .collect()
}

fn union_expiry_dates(rows: &[&FilmUnit]) -> Vec<String> {
    let mut union: Vec<String> = Vec::new();
    for unit in rows {
        for date in &unit.expiry_dates {
            if !union.contains(date) {
                union.push(date.clone());
            }
        }
    }
    union
}

/// Full-table read followed by the grouping pass
pub fn load_grouped(conn: &Connection) -> Result<Vec<GroupedFilm>, AppError> {
    Ok(grouped_films(&film_service::list_films(conn)?))
}

/// "Rolls in inventory" total. Sheet formats are counted per sheet and
/// would distort the roll count, so they are excluded here.
pub fn rolls_in_inventory(units: &[FilmUnit]) -> u32 {
    units
        .iter()
        .filter(|u| !u.format.is_sheet())
        .map(|u| u.quantity)
        .sum()
}

/// Caller-side filter over the grouped aggregates, so several simultaneous
/// filter views can share one grouping pass.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub manufacturer: Option<String>,
    pub film_type: Option<FilmType>,
    pub min_speed: Option<u32>,
    pub max_speed: Option<u32>,
    pub format: Option<FilmFormat>,
    pub frozen_only: bool,
    pub in_stock_only: bool,
}

impl GroupFilter {
    pub fn matches(&self, group: &GroupedFilm) -> bool {
        if let Some(manufacturer) = &self.manufacturer {
            if !group.manufacturer.eq_ignore_ascii_case(manufacturer) {
                return false;
            }
        }
        if let Some(film_type) = self.film_type {
            if group.film_type != film_type {
                return false;
            }
        }
        if let Some(min) = self.min_speed {
            if group.speed < min {
                return false;
            }
        }
        if let Some(max) = self.max_speed {
            if group.speed > max {
                return false;
            }
        }
        if let Some(format) = &self.format {
            if !group.formats.iter().any(|f| &f.format == format) {
                return false;
            }
        }
        if self.frozen_only && !group.formats.iter().any(|f| f.is_frozen) {
            return false;
        }
        if self.in_stock_only && group.total_quantity() == 0 {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, groups: &'a [GroupedFilm]) -> Vec<&'a GroupedFilm> {
        groups.iter().filter(|g| self.matches(g)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, format: FilmFormat, quantity: u32) -> FilmUnit {
        let mut u = FilmUnit::new(name, "Kodak", FilmType::Color, 400, format);
        u.quantity = quantity;
        u
    }

    #[test]
    fn test_grouping_is_pure() {
        let units = vec![
            unit("Portra 400", FilmFormat::Mm35, 2),
            unit("Ektar 100", FilmFormat::Mm120, 1),
            unit("Portra 400", FilmFormat::Mm35, 1),
        ];

        let first = grouped_films(&units);
        let second = grouped_films(&units);
        assert_eq!(first, second);
    }

    #[test]
    fn test_grouping_keeps_insertion_order() {
        let units = vec![
            unit("Zebra 100", FilmFormat::Mm35, 1),
            unit("Alpha 200", FilmFormat::Mm35, 1),
        ];

        let groups = grouped_films(&units);
        assert_eq!(groups[0].name, "Zebra 100");
        assert_eq!(groups[1].name, "Alpha 200");
    }

    #[test]
    fn test_format_quantity_sums_across_rows() {
        // same product and format, different expiry: distinct rows, one
        // FormatInfo summing both
        let mut a = unit("Portra 400", FilmFormat::Mm35, 2);
        a.expiry_dates = vec!["12/2026".to_string()];
        let mut b = unit("Portra 400", FilmFormat::Mm35, 1);
        b.expiry_dates = vec!["2027".to_string()];

        let groups = grouped_films(&[a.clone(), b.clone()]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].formats.len(), 1);

        let info = &groups[0].formats[0];
        assert_eq!(info.total_quantity, 3);
        assert_eq!(info.roll_ids, vec![a.uuid.clone(), b.uuid.clone()]);
        // representative fields stay attached to the first in-stock row
        assert_eq!(info.expiry_dates, vec!["12/2026".to_string()]);
        // derived queries see the union of both rows' dates
        assert_eq!(
            groups[0].all_expiry_dates,
            vec!["12/2026".to_string(), "2027".to_string()]
        );
    }

    #[test]
    fn test_formats_partition_by_custom_name() {
        let a = unit("Sheet film", FilmFormat::Other("9x12".to_string()), 1);
        let b = unit("Sheet film", FilmFormat::Other("13x18".to_string()), 1);

        let groups = grouped_films(&[a, b]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].formats.len(), 2);
    }

    #[test]
    fn test_representative_prefers_rows_in_stock() {
        let mut finished = unit("Portra 400", FilmFormat::Mm35, 0);
        finished.comments = Some("finished".to_string());
        let mut fresh = unit("Portra 400", FilmFormat::Mm35, 1);
        fresh.comments = Some("fresh".to_string());

        let groups = grouped_films(&[finished, fresh]);
        assert_eq!(
            groups[0].formats[0].comments.as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn test_rolls_in_inventory_excludes_sheets() {
        let units = vec![
            unit("Portra 400", FilmFormat::Mm35, 3),
            unit("Portra 160", FilmFormat::Sheet4x5, 25),
            unit("Delta 100", FilmFormat::Mm120, 2),
        ];
        assert_eq!(rolls_in_inventory(&units), 5);
    }

    #[test]
    fn test_filters_share_one_grouping_pass() {
        let mut frozen = unit("Provia 100F", FilmFormat::Mm120, 1);
        frozen.film_type = FilmType::Slide;
        frozen.speed = 100;
        frozen.is_frozen = true;
        let units = vec![unit("Portra 400", FilmFormat::Mm35, 2), frozen];

        let groups = grouped_films(&units);

        let frozen_view = GroupFilter {
            frozen_only: true,
            ..Default::default()
        };
        assert_eq!(frozen_view.apply(&groups).len(), 1);

        let slow_view = GroupFilter {
            max_speed: Some(200),
            ..Default::default()
        };
        assert_eq!(slow_view.apply(&groups).len(), 1);
        assert_eq!(slow_view.apply(&groups)[0].name, "Provia 100F");

        let format_view = GroupFilter {
            format: Some(FilmFormat::Mm35),
            ..Default::default()
        };
        assert_eq!(format_view.apply(&groups).len(), 1);
    }
}
