//! Bronze → silver → warehouse pipeline: keep-first dedup on normalize and
//! full-replace semantics on load.

use arrow_array::{Array, StringArray};
use garimpo_etl::config::{EtlConfig, Source};
use garimpo_etl::normalize;
use garimpo_etl::silver::{self, CNPJ_SNAPSHOT};
use garimpo_etl::warehouse::Warehouse;

fn write_bronze(config: &EtlConfig, rel: &str, contents: &str) {
    let path = config.bronze_dir(Source::Cnpj).join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn string_column<'a>(
    batch: &'a arrow_array::RecordBatch,
    name: &str,
) -> &'a StringArray {
    let idx = batch.schema().index_of(name).unwrap();
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
}

#[test]
fn normalize_dedups_keep_first_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());

    // First-parsed file wins on the shared identifier; the second file is
    // semicolon-delimited to exercise the delimiter fallback too.
    write_bronze(
        &config,
        "arquivo1/01.csv",
        "cnpj,razao_social,uf,cnae_principal\n\
         12.345.678/0001-95,ACME LTDA,SP,6201-5/01\n\
         98765432000110,BETA SA,RJ,9999-9/99\n",
    );
    write_bronze(
        &config,
        "arquivo2/02.csv",
        "cnpj;razao_social\n12345678000195;ACME RENAMED\n",
    );

    let snapshot = normalize::cnpj::run(&config).unwrap().unwrap();
    assert_eq!(snapshot, config.silver_dir(Source::Cnpj).join(CNPJ_SNAPSHOT));

    let (schema, batches) = silver::read_snapshot(&snapshot).unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 2, "duplicate cnpj14 must collapse to one row");

    let ids = string_column(batch, "cnpj14");
    let legal_names = string_column(batch, "legal_name");
    assert_eq!(ids.value(0), "12345678000195");
    assert_eq!(legal_names.value(0), "ACME LTDA", "first-parsed row wins");
    assert_eq!(ids.value(1), "98765432000110");

    // cnae_desc is derived for known codes and null otherwise.
    assert!(schema.index_of("cnae_desc").is_ok());
    let descs = string_column(batch, "cnae_desc");
    assert!(descs.value(0).contains("Desenvolvimento"));
    assert!(descs.is_null(1));

    // Second file had no uf column; its surviving rows would carry nulls.
    assert!(schema.index_of("uf").is_ok());
}

#[test]
fn normalize_drops_rows_without_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());
    write_bronze(
        &config,
        "a/input.csv",
        "cnpj,razao_social\n,SEM CNPJ\nn/a,TAMBEM SEM\n11222333000181,OK SA\n",
    );

    let snapshot = normalize::cnpj::run(&config).unwrap().unwrap();
    let (_, batches) = silver::read_snapshot(&snapshot).unwrap();
    assert_eq!(batches[0].num_rows(), 1);
    assert_eq!(string_column(&batches[0], "cnpj14").value(0), "11222333000181");
}

#[test]
fn normalize_without_inputs_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());
    assert!(normalize::cnpj::run(&config).unwrap().is_none());
    assert!(!config.silver_dir(Source::Cnpj).join(CNPJ_SNAPSHOT).exists());
}

#[tokio::test]
async fn load_replaces_existing_rows_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());
    write_bronze(
        &config,
        "a/input.csv",
        "cnpj,razao_social\n11222333000181,NOVA SA\n44555666000172,OUTRA LTDA\n",
    );
    normalize::cnpj::run(&config).unwrap().unwrap();

    let warehouse = Warehouse::connect(&config.warehouse_path).await.unwrap();

    // Seed three stale rows; the load must leave none of them behind.
    for i in 0..3 {
        sqlx::query("INSERT INTO cnpj_firmographics (cnpj14, legal_name) VALUES (?1, 'STALE')")
            .bind(format!("0000000000000{i}"))
            .execute(warehouse.pool())
            .await
            .unwrap();
    }
    assert_eq!(warehouse.count("cnpj_firmographics").await.unwrap(), 3);

    warehouse.load(&config).await.unwrap();

    assert_eq!(warehouse.count("cnpj_firmographics").await.unwrap(), 2);
    let stale: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cnpj_firmographics WHERE legal_name = 'STALE'")
            .fetch_one(warehouse.pool())
            .await
            .unwrap();
    assert_eq!(stale.0, 0);
}

#[tokio::test]
async fn load_skips_missing_snapshot_without_touching_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());

    let warehouse = Warehouse::connect(&config.warehouse_path).await.unwrap();
    sqlx::query("INSERT INTO cnpj_firmographics (cnpj14) VALUES ('00000000000001')")
        .execute(warehouse.pool())
        .await
        .unwrap();

    let loaded = warehouse
        .load_source(
            "cnpj_firmographics",
            &config.silver_dir(Source::Cnpj).join(CNPJ_SNAPSHOT),
        )
        .await
        .unwrap();

    assert_eq!(loaded, None, "missing snapshot is a soft skip");
    assert_eq!(warehouse.count("cnpj_firmographics").await.unwrap(), 1);
}

#[tokio::test]
async fn load_of_empty_snapshot_clears_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());
    // Headers only: the snapshot exists but holds zero rows.
    write_bronze(&config, "a/input.csv", "cnpj,razao_social\n");
    normalize::cnpj::run(&config).unwrap().unwrap();

    let warehouse = Warehouse::connect(&config.warehouse_path).await.unwrap();
    sqlx::query("INSERT INTO cnpj_firmographics (cnpj14) VALUES ('00000000000001')")
        .execute(warehouse.pool())
        .await
        .unwrap();

    let loaded = warehouse
        .load_source(
            "cnpj_firmographics",
            &config.silver_dir(Source::Cnpj).join(CNPJ_SNAPSHOT),
        )
        .await
        .unwrap();

    assert_eq!(loaded, Some(0));
    assert_eq!(warehouse.count("cnpj_firmographics").await.unwrap(), 0);
}

#[tokio::test]
async fn load_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig::rooted_at(dir.path());
    write_bronze(&config, "a/input.csv", "cnpj,razao_social\n11222333000181,NOVA SA\n");
    normalize::cnpj::run(&config).unwrap().unwrap();

    let warehouse = Warehouse::connect(&config.warehouse_path).await.unwrap();
    warehouse.load(&config).await.unwrap();
    warehouse.load(&config).await.unwrap();
    assert_eq!(warehouse.count("cnpj_firmographics").await.unwrap(), 1);
}
