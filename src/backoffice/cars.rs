//! Cars list page

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{store_failure, PageError};
use crate::notices;
use crate::records::{Car, CarOrder, CarStatus, RecordStore};

/// Selector value meaning "no filter"
pub const ALL: &str = "all";

/// In-memory filters of the cars list. All filters are AND-combined.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CarFilter {
    /// Case-insensitive substring of name or brand
    #[serde(default)]
    pub search: Option<String>,
    /// Exact brand, unless empty or "all"
    #[serde(default)]
    pub brand: Option<String>,
    /// Exact status, unless empty or "all"
    #[serde(default)]
    pub status: Option<String>,
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        if let Some(term) = active(&self.search) {
            let term = term.to_lowercase();
            if !car.name.to_lowercase().contains(&term) && !car.brand.to_lowercase().contains(&term) {
                return false;
            }
        }

        if let Some(brand) = selected(&self.brand) {
            if car.brand != brand {
                return false;
            }
        }

        if let Some(status) = selected(&self.status) {
            if car.status.as_str() != status {
                return false;
            }
        }

        true
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn selected(value: &Option<String>) -> Option<&str> {
    active(value).filter(|v| !v.eq_ignore_ascii_case(ALL))
}

pub fn filter_cars(cars: &[Car], filter: &CarFilter) -> Vec<Car> {
    cars.iter().filter(|car| filter.matches(car)).cloned().collect()
}

/// Distinct brands, sorted, for the brand selector
pub fn brands(cars: &[Car]) -> Vec<String> {
    cars.iter()
        .map(|car| car.brand.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// What the cars page renders
#[derive(Debug, Clone, Serialize)]
pub struct CarsView {
    pub cars: Vec<Car>,
    pub brands: Vec<String>,
    /// Size of the unfiltered inventory
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Clone)]
pub struct CarsPage {
    records: Arc<RecordStore>,
}

impl CarsPage {
    pub fn new(records: Arc<RecordStore>) -> Self {
        Self { records }
    }

    pub fn list(&self, filter: &CarFilter) -> Result<CarsView, PageError> {
        let cars = self
            .records
            .list_cars(CarOrder::recently_updated())
            .map_err(store_failure(notices::CARS_LOAD_FAILED))?;

        Ok(CarsView {
            brands: brands(&cars),
            total: cars.len(),
            cars: filter_cars(&cars, filter),
            notice: None,
        })
    }

    /// Delete, then return the reloaded list. Stored photos are left in
    /// the bucket.
    pub fn delete(&self, id: i64, filter: &CarFilter) -> Result<CarsView, PageError> {
        self.records
            .delete_car(id)
            .map_err(store_failure(notices::CAR_DELETE_FAILED))?;
        tracing::info!(car_id = id, "Car deleted");

        let mut view = self.list(filter)?;
        view.notice = Some(notices::CAR_DELETED);
        Ok(view)
    }

    /// Set status to sold, then return the reloaded list
    pub fn mark_sold(&self, id: i64, filter: &CarFilter) -> Result<CarsView, PageError> {
        self.records
            .set_car_status(id, CarStatus::Sold)
            .map_err(store_failure(notices::STATUS_UPDATE_FAILED))?;
        tracing::info!(car_id = id, "Car marked as sold");

        let mut view = self.list(filter)?;
        view.notice = Some(notices::CAR_MARKED_SOLD);
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::store::tests::sample_record;

    fn page() -> (CarsPage, Arc<RecordStore>) {
        let records = Arc::new(RecordStore::open_in_memory().unwrap());
        records.insert_car(&sample_record("Civic EXL", "Honda")).unwrap();
        records.insert_car(&sample_record("Fit LX", "Honda")).unwrap();
        let mut sold = sample_record("Corolla", "Toyota");
        sold.status = CarStatus::Sold;
        records.insert_car(&sold).unwrap();
        records.insert_car(&sample_record("Hilux SRV", "Toyota")).unwrap();
        (CarsPage::new(Arc::clone(&records)), records)
    }

    fn filter(search: &str, brand: &str, status: &str) -> CarFilter {
        CarFilter {
            search: Some(search.to_string()),
            brand: Some(brand.to_string()),
            status: Some(status.to_string()),
        }
    }

    fn names(view: &CarsView) -> Vec<&str> {
        let mut names: Vec<&str> = view.cars.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_no_filter_lists_everything() {
        let (page, _) = page();
        let view = page.list(&CarFilter::default()).unwrap();
        assert_eq!(view.cars.len(), 4);
        assert_eq!(view.total, 4);
        assert_eq!(view.brands, vec!["Honda", "Toyota"]);

        let view = page.list(&filter("", "all", "all")).unwrap();
        assert_eq!(view.cars.len(), 4);
    }

    #[test]
    fn test_search_matches_name_or_brand_case_insensitive() {
        let (page, _) = page();

        let view = page.list(&filter("CIVIC", "all", "all")).unwrap();
        assert_eq!(names(&view), vec!["Civic EXL"]);

        let view = page.list(&filter("toy", "", "")).unwrap();
        assert_eq!(names(&view), vec!["Corolla", "Hilux SRV"]);
    }

    #[test]
    fn test_filters_are_combined() {
        let (page, _) = page();

        let view = page.list(&filter("", "Toyota", "disponível")).unwrap();
        assert_eq!(names(&view), vec!["Hilux SRV"]);

        let view = page.list(&filter("l", "Honda", "all")).unwrap();
        assert_eq!(names(&view), vec!["Civic EXL", "Fit LX"]);

        // brand filter is exact
        let view = page.list(&filter("", "honda", "all")).unwrap();
        assert!(view.cars.is_empty());
        assert_eq!(view.total, 4);
    }

    #[test]
    fn test_status_filter_is_exact() {
        let (page, _) = page();

        let view = page.list(&filter("", "all", "vendido")).unwrap();
        assert_eq!(names(&view), vec!["Corolla"]);

        for status in ["Sold", "sold", "VENDIDO", "Vendido"] {
            let view = page.list(&filter("", "all", status)).unwrap();
            assert!(view.cars.is_empty(), "{} should not match", status);
        }
    }

    #[test]
    fn test_mark_sold_reloads() {
        let (page, records) = page();
        let civic = records
            .list_cars(CarOrder::recently_updated())
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Civic EXL")
            .unwrap();

        let view = page.mark_sold(civic.id, &filter("", "all", "vendido")).unwrap();
        assert_eq!(names(&view), vec!["Civic EXL", "Corolla"]);
        assert_eq!(view.notice, Some("Carro marcado como vendido"));
    }

    #[test]
    fn test_delete_reloads() {
        let (page, records) = page();
        let first = records.list_cars(CarOrder::recently_updated()).unwrap()[0].clone();

        let view = page.delete(first.id, &CarFilter::default()).unwrap();
        assert_eq!(view.total, 3);
        assert!(view.cars.iter().all(|c| c.id != first.id));

        let err = page.delete(first.id, &CarFilter::default()).unwrap_err();
        assert!(matches!(err, PageError::NotFound { .. }));
    }
}
