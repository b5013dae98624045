#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use salesmart_core::config::{DateRange, EtlConfig};
use tempfile::TempDir;

/// A throwaway data/log directory pair laid out like a production data root.
pub struct Workspace {
    root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.path().join("logs")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir().join("output")
    }

    pub fn config(&self) -> EtlConfig {
        EtlConfig::new(self.data_dir(), self.log_dir())
    }

    pub fn config_for_range(&self, start: (i32, u32, u32), end: (i32, u32, u32)) -> EtlConfig {
        let mut config = self.config();
        config.date_range = Some(DateRange::new(ymd(start), ymd(end)).expect("range"));
        config
    }

    fn prepare(&self, relative: &str) -> PathBuf {
        let path = self.data_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        path
    }

    /// Sales rows of `(Amount, StoreID, CashierId)` written as parquet.
    pub fn sales_parquet(&self, relative: &str, rows: &[(f64, i64, i64)]) -> PathBuf {
        let path = self.prepare(relative);
        let mut df = sales_frame(rows);
        let mut file = File::create(&path).expect("create parquet");
        ParquetWriter::new(&mut file)
            .finish(&mut df)
            .expect("write parquet");
        path
    }

    pub fn sales_csv(&self, relative: &str, rows: &[(f64, i64, i64)]) -> PathBuf {
        let path = self.prepare(relative);
        let mut body = String::from("Amount,StoreID,CashierId\n");
        for (amount, store, cashier) in rows {
            body.push_str(&format!("{amount:.2},{store},{cashier}\n"));
        }
        fs::write(&path, body).expect("write csv");
        path
    }

    pub fn store_workbook(&self, rows: &[(i64, &str)]) -> PathBuf {
        let path = self.prepare("master_store.xlsx");
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_mut(&0).expect("default sheet");
            sheet.get_cell_mut("A1").set_value("StoreID");
            sheet.get_cell_mut("B1").set_value("StoreName");
            for (idx, (id, name)) in rows.iter().enumerate() {
                let row = idx + 2;
                sheet
                    .get_cell_mut(format!("A{row}").as_str())
                    .set_value_number(*id as f64);
                sheet.get_cell_mut(format!("B{row}").as_str()).set_value(*name);
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
        path
    }

    pub fn cashier_json(&self, name: &str, body: &str) -> PathBuf {
        let path = self.prepare(&format!("cashier_data/{name}"));
        fs::write(&path, body).expect("write cashier snapshot");
        path
    }

    pub fn corrupt_file(&self, relative: &str) -> PathBuf {
        let path = self.prepare(relative);
        fs::write(&path, b"this is not the format you are looking for").expect("write garbage");
        path
    }

    /// The store/cashier references and January 2024 parquet data used by most scenarios.
    pub fn seed_retail_scenario(&self) {
        self.sales_parquet(
            "sales_data/Year=2024/Month=1/Day=2/part-0.parquet",
            &[(10.0, 1, 9)],
        );
        self.sales_parquet(
            "sales_data/Year=2024/Month=6/Day=1/part-0.parquet",
            &[(20.0, 2, 9)],
        );
        self.store_workbook(&[(1, "North"), (2, "South")]);
        self.cashier_json(
            "cashier_1.json",
            r#"{"snap-1": {"CashierId": 9, "Name": "Alice", "Email": "alice@example.com"}}"#,
        );
    }
}

pub fn ymd(date: (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date")
}

pub fn sales_frame(rows: &[(f64, i64, i64)]) -> DataFrame {
    df!(
        "Amount" => rows.iter().map(|row| row.0).collect::<Vec<_>>(),
        "StoreID" => rows.iter().map(|row| row.1).collect::<Vec<_>>(),
        "CashierId" => rows.iter().map(|row| row.2).collect::<Vec<_>>(),
    )
    .expect("sales frame")
}

pub fn read_output(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("csv reader")
        .finish()
        .expect("read output csv")
}

pub fn csv_files_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect(),
        Err(_) => Vec::new(),
    }
}
