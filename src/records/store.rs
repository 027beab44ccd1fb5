//! Record Store - SQLite-backed `carros` and `leads` tables
//!
//! Thin select/insert/update/delete wrapper over a single SQLite connection.
//! Every committed write is published on the [`ChangeFeed`].
//!
//! There is no version column: concurrent edits of the same row are not
//! reconciled and the last write wins.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::changes::{ChangeEvent, ChangeFeed, ChangeKind};
use super::error::{StoreError, StoreResult};
use super::types::{
    Car, CarOrder, CarRecord, CarStatus, FinancingStatus, Lead, NewLead, SortDirection, Table,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS carros (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome TEXT NOT NULL,
        marca TEXT NOT NULL,
        tipo TEXT NOT NULL DEFAULT '',
        cambio TEXT NOT NULL DEFAULT '',
        ano INTEGER NOT NULL,
        preco REAL NOT NULL,
        status TEXT NOT NULL DEFAULT 'disponível',
        fotos TEXT NOT NULL DEFAULT '[]',
        fotos_internas TEXT NOT NULL DEFAULT '[]',
        visitas INTEGER NOT NULL DEFAULT 0,
        atendimentos INTEGER NOT NULL DEFAULT 0,
        atualizado_em INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_carros_atualizado_em ON carros(atualizado_em);
    CREATE INDEX IF NOT EXISTS idx_carros_visitas ON carros(visitas);

    CREATE TABLE IF NOT EXISTS leads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome TEXT,
        carro_interesse TEXT,
        telefone TEXT,
        email TEXT,
        observacoes TEXT,
        resumo TEXT,
        status_financiamento TEXT NOT NULL DEFAULT 'pendente',
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads(created_at);
";

const CAR_COLUMNS: &str = "id, nome, marca, tipo, cambio, ano, preco, status, fotos, \
                           fotos_internas, visitas, atendimentos, atualizado_em";

const LEAD_COLUMNS: &str = "id, nome, carro_interesse, telefone, email, observacoes, resumo, \
                            status_financiamento, created_at";

/// SQLite-backed record store
pub struct RecordStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    changes: ChangeFeed,
}

impl RecordStore {
    /// Create or open `showroom.db` inside `data_dir`
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join("showroom.db");

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init(conn, Some(path))
    }

    /// In-memory store (tests and dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = ?path, "Record store ready");

        Ok(Self {
            conn: Mutex::new(conn),
            path,
            changes: ChangeFeed::default(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Row change notifications
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Cheap round-trip used by the readiness probe
    pub fn ping(&self) -> StoreResult<()> {
        self.conn()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    // ==================== Cars ====================

    pub fn list_cars(&self, order: CarOrder) -> StoreResult<Vec<Car>> {
        let sql = format!(
            "SELECT {} FROM carros ORDER BY {} {}, id {} LIMIT ?",
            CAR_COLUMNS,
            order.column.sql(),
            order.direction.sql(),
            order.direction.sql(),
        );
        let limit = order.limit.map(|l| l as i64).unwrap_or(-1);

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let cars = stmt
            .query_map(params![limit], car_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cars)
    }

    pub fn get_car(&self, id: i64) -> StoreResult<Option<Car>> {
        let conn = self.conn()?;
        Self::get_car_with(&conn, id)
    }

    fn get_car_with(conn: &Connection, id: i64) -> StoreResult<Option<Car>> {
        let sql = format!("SELECT {} FROM carros WHERE id = ?", CAR_COLUMNS);
        let car = conn
            .prepare_cached(&sql)?
            .query_row(params![id], car_from_row)
            .optional()?;
        Ok(car)
    }

    pub fn insert_car(&self, record: &CarRecord) -> StoreResult<Car> {
        let photos = serde_json::to_string(&record.photos)?;
        let interior = serde_json::to_string(&record.interior_photos)?;

        let car = {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO carros
                    (nome, marca, tipo, cambio, ano, preco, status, fotos, fotos_internas,
                     visitas, atendimentos, atualizado_em)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)",
                params![
                    record.name,
                    record.brand,
                    record.vehicle_type,
                    record.transmission,
                    record.year,
                    record.price,
                    record.status.as_str(),
                    photos,
                    interior,
                    now_millis(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            Self::get_car_with(&conn, id)?.ok_or(StoreError::NotFound {
                table: "carros",
                id,
            })?
        };

        self.changes
            .publish(ChangeEvent::new(Table::Cars, ChangeKind::Insert, car.id));
        Ok(car)
    }

    pub fn update_car(&self, id: i64, record: &CarRecord) -> StoreResult<Car> {
        let photos = serde_json::to_string(&record.photos)?;
        let interior = serde_json::to_string(&record.interior_photos)?;

        let car = {
            let conn = self.conn()?;
            let changed = conn.execute(
                "UPDATE carros SET
                    nome = ?, marca = ?, tipo = ?, cambio = ?, ano = ?, preco = ?, status = ?,
                    fotos = ?, fotos_internas = ?, atualizado_em = ?
                 WHERE id = ?",
                params![
                    record.name,
                    record.brand,
                    record.vehicle_type,
                    record.transmission,
                    record.year,
                    record.price,
                    record.status.as_str(),
                    photos,
                    interior,
                    now_millis(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    table: "carros",
                    id,
                });
            }
            Self::get_car_with(&conn, id)?.ok_or(StoreError::NotFound {
                table: "carros",
                id,
            })?
        };

        self.changes
            .publish(ChangeEvent::new(Table::Cars, ChangeKind::Update, id));
        Ok(car)
    }

    pub fn set_car_status(&self, id: i64, status: CarStatus) -> StoreResult<()> {
        let changed = self.conn()?.execute(
            "UPDATE carros SET status = ?, atualizado_em = ? WHERE id = ?",
            params![status.as_str(), now_millis(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table: "carros",
                id,
            });
        }

        self.changes
            .publish(ChangeEvent::new(Table::Cars, ChangeKind::Update, id));
        Ok(())
    }

    pub fn delete_car(&self, id: i64) -> StoreResult<()> {
        let changed = self
            .conn()?
            .execute("DELETE FROM carros WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table: "carros",
                id,
            });
        }

        self.changes
            .publish(ChangeEvent::new(Table::Cars, ChangeKind::Delete, id));
        Ok(())
    }

    /// Count cars, optionally only those with `status`
    pub fn count_cars(&self, status: Option<CarStatus>) -> StoreResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM carros WHERE ?1 IS NULL OR status = ?1",
            params![status.map(|s| s.as_str())],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Sum of `atendimentos` over all cars
    pub fn total_inquiries(&self) -> StoreResult<i64> {
        let total: i64 = self.conn()?.query_row(
            "SELECT COALESCE(SUM(atendimentos), 0) FROM carros",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // ==================== Leads ====================

    pub fn list_leads(&self, direction: SortDirection) -> StoreResult<Vec<Lead>> {
        let sql = format!(
            "SELECT {} FROM leads ORDER BY created_at {}, id {}",
            LEAD_COLUMNS,
            direction.sql(),
            direction.sql()
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let leads = stmt
            .query_map([], lead_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(leads)
    }

    pub fn get_lead(&self, id: i64) -> StoreResult<Option<Lead>> {
        let conn = self.conn()?;
        Self::get_lead_with(&conn, id)
    }

    fn get_lead_with(conn: &Connection, id: i64) -> StoreResult<Option<Lead>> {
        let sql = format!("SELECT {} FROM leads WHERE id = ?", LEAD_COLUMNS);
        let lead = conn
            .prepare_cached(&sql)?
            .query_row(params![id], lead_from_row)
            .optional()?;
        Ok(lead)
    }

    /// Store a lead delivered by the capture channel
    pub fn insert_lead(&self, lead: &NewLead) -> StoreResult<Lead> {
        let created = {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO leads
                    (nome, carro_interesse, telefone, email, observacoes, resumo,
                     status_financiamento, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    lead.name,
                    lead.car_of_interest,
                    lead.phone,
                    lead.email,
                    lead.notes,
                    lead.summary,
                    lead.financing_status.as_str(),
                    now_millis(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            Self::get_lead_with(&conn, id)?.ok_or(StoreError::NotFound { table: "leads", id })?
        };

        self.changes
            .publish(ChangeEvent::new(Table::Leads, ChangeKind::Insert, created.id));
        Ok(created)
    }

    pub fn update_lead_financing(&self, id: i64, status: FinancingStatus) -> StoreResult<Lead> {
        let lead = {
            let conn = self.conn()?;
            let changed = conn.execute(
                "UPDATE leads SET status_financiamento = ? WHERE id = ?",
                params![status.as_str(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound { table: "leads", id });
            }
            Self::get_lead_with(&conn, id)?.ok_or(StoreError::NotFound { table: "leads", id })?
        };

        self.changes
            .publish(ChangeEvent::new(Table::Leads, ChangeKind::Update, id));
        Ok(lead)
    }

    /// Count leads, optionally only those with `status`
    pub fn count_leads(&self, status: Option<FinancingStatus>) -> StoreResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM leads WHERE ?1 IS NULL OR status_financiamento = ?1",
            params![status.map(|s| s.as_str())],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    #[cfg(test)]
    pub(crate) fn set_engagement(&self, id: i64, visits: i64, inquiries: i64) -> StoreResult<()> {
        self.conn()?.execute(
            "UPDATE carros SET visitas = ?, atendimentos = ? WHERE id = ?",
            params![visits, inquiries, id],
        )?;
        Ok(())
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", millis).into(),
        )
    })
}

fn photos_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e.to_string()))
}

fn car_from_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    let status: String = row.get(7)?;

    Ok(Car {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        vehicle_type: row.get(3)?,
        transmission: row.get(4)?,
        year: row.get(5)?,
        price: row.get(6)?,
        status: status.parse().map_err(|e| conversion_error(7, e))?,
        photos: photos_at(row, 8)?,
        interior_photos: photos_at(row, 9)?,
        visits: row.get(10)?,
        inquiries: row.get(11)?,
        updated_at: timestamp_at(row, 12)?,
    })
}

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    let status: String = row.get(7)?;

    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        car_of_interest: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        notes: row.get(5)?,
        summary: row.get(6)?,
        financing_status: status.parse().map_err(|e| conversion_error(7, e))?,
        created_at: timestamp_at(row, 8)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) fn sample_record(name: &str, brand: &str) -> CarRecord {
        CarRecord {
            name: name.to_string(),
            brand: brand.to_string(),
            vehicle_type: "hatch".to_string(),
            transmission: "manual".to_string(),
            year: 2022,
            price: 79_990.0,
            status: CarStatus::Available,
            photos: Vec::new(),
            interior_photos: Vec::new(),
        }
    }

    pub(crate) fn sample_lead(name: &str, car: &str, phone: &str) -> NewLead {
        NewLead {
            name: Some(name.to_string()),
            car_of_interest: Some(car.to_string()),
            phone: Some(phone.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_creates_database_file() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        assert!(store.path().unwrap().exists());
        store.ping().unwrap();
    }

    #[test]
    fn test_insert_and_get_car() {
        let store = RecordStore::open_in_memory().unwrap();

        let mut record = sample_record("Onix 1.5 LTZ", "Chevrolet");
        record.photos = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        let car = store.insert_car(&record).unwrap();

        assert_eq!(car.name, "Onix 1.5 LTZ");
        assert_eq!(car.visits, 0);
        assert_eq!(car.inquiries, 0);
        assert_eq!(car.photos, vec!["a.jpg", "b.jpg"]);

        let fetched = store.get_car(car.id).unwrap().unwrap();
        assert_eq!(fetched, car);
        assert!(store.get_car(car.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_update_car() {
        let store = RecordStore::open_in_memory().unwrap();
        let car = store.insert_car(&sample_record("Onix", "Chevrolet")).unwrap();

        let mut record = sample_record("Onix Plus", "Chevrolet");
        record.status = CarStatus::InReview;
        let updated = store.update_car(car.id, &record).unwrap();

        assert_eq!(updated.name, "Onix Plus");
        assert_eq!(updated.status, CarStatus::InReview);
        assert!(updated.updated_at >= car.updated_at);

        let missing = store.update_car(999, &record);
        assert!(matches!(missing, Err(StoreError::NotFound { id: 999, .. })));
    }

    #[test]
    fn test_status_delete_and_counts() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = store.insert_car(&sample_record("Onix", "Chevrolet")).unwrap();
        let b = store.insert_car(&sample_record("HB20", "Hyundai")).unwrap();

        store.set_car_status(a.id, CarStatus::Sold).unwrap();
        assert_eq!(store.count_cars(None).unwrap(), 2);
        assert_eq!(store.count_cars(Some(CarStatus::Available)).unwrap(), 1);
        assert_eq!(store.count_cars(Some(CarStatus::Sold)).unwrap(), 1);

        store.delete_car(b.id).unwrap();
        assert_eq!(store.count_cars(None).unwrap(), 1);
        assert!(matches!(
            store.delete_car(b.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_cars_ordering() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = store.insert_car(&sample_record("Onix", "Chevrolet")).unwrap();
        let b = store.insert_car(&sample_record("HB20", "Hyundai")).unwrap();
        let c = store.insert_car(&sample_record("Kwid", "Renault")).unwrap();

        store.set_engagement(a.id, 5, 1).unwrap();
        store.set_engagement(b.id, 50, 7).unwrap();
        store.set_engagement(c.id, 20, 2).unwrap();

        let top = store.list_cars(CarOrder::most_visited(2)).unwrap();
        let names: Vec<_> = top.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["HB20", "Kwid"]);

        let recent = store.list_cars(CarOrder::recently_updated()).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, c.id);

        assert_eq!(store.total_inquiries().unwrap(), 10);
    }

    #[test]
    fn test_leads_crud() {
        let store = RecordStore::open_in_memory().unwrap();
        let first = store
            .insert_lead(&sample_lead("Maria", "Onix", "11999990000"))
            .unwrap();
        let second = store.insert_lead(&NewLead::default()).unwrap();

        assert_eq!(first.financing_status, FinancingStatus::Pending);
        assert!(second.name.is_none());

        let desc = store.list_leads(SortDirection::Descending).unwrap();
        assert_eq!(desc[0].id, second.id);
        let asc = store.list_leads(SortDirection::Ascending).unwrap();
        assert_eq!(asc[0].id, first.id);

        let updated = store
            .update_lead_financing(first.id, FinancingStatus::Approved)
            .unwrap();
        assert_eq!(updated.financing_status, FinancingStatus::Approved);
        assert_eq!(store.count_leads(None).unwrap(), 2);
        assert_eq!(
            store.count_leads(Some(FinancingStatus::Approved)).unwrap(),
            1
        );
        assert!(matches!(
            store.update_lead_financing(77, FinancingStatus::Rejected),
            Err(StoreError::NotFound { table: "leads", .. })
        ));
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut rx = store.changes().subscribe();

        let car = store.insert_car(&sample_record("Onix", "Chevrolet")).unwrap();
        store.delete_car(car.id).unwrap();
        let lead = store.insert_lead(&NewLead::default()).unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::new(Table::Cars, ChangeKind::Insert, car.id)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::new(Table::Cars, ChangeKind::Delete, car.id)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::new(Table::Leads, ChangeKind::Insert, lead.id)
        );
    }
}
