/// Integration tests for return periods served from PostgreSQL
///
/// Tests verify:
/// 1. Thresholds stored in the `return_periods` table are read per era and watershed
/// 2. Rows of other eras or watersheds are not mixed in
///
/// Prerequisites:
/// - PostgreSQL reachable through DATABASE_URL (set in .env)
/// - Permission to create the `return_periods` table
///
/// Run with: cargo test --test return_period_database -- --ignored --test-threads=1

use postgres::{Client, NoTls};
use std::env;

use spt_summary::ingest::return_periods::fetch_return_periods;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn setup_test_db() -> Client {
    dotenv::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut client = Client::connect(&database_url, NoTls).expect("Failed to connect to test database");

    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS return_periods (
                 rivid     BIGINT NOT NULL,
                 era       TEXT NOT NULL,
                 watershed TEXT NOT NULL,
                 rp_2      DOUBLE PRECISION NOT NULL,
                 rp_5      DOUBLE PRECISION NOT NULL,
                 rp_10     DOUBLE PRECISION NOT NULL,
                 rp_25     DOUBLE PRECISION NOT NULL,
                 rp_50     DOUBLE PRECISION NOT NULL,
                 rp_100    DOUBLE PRECISION NOT NULL,
                 PRIMARY KEY (rivid, era, watershed)
             )",
        )
        .expect("Failed to create return_periods table");

    cleanup_test_data(&mut client);

    client
        .batch_execute(
            "INSERT INTO return_periods
             (rivid, era, watershed, rp_2, rp_5, rp_10, rp_25, rp_50, rp_100)
             VALUES
             (101, 'era_5', 'TEST-geoglows', 10, 20, 100, 500, 1000, 5000),
             (102, 'era_5', 'TEST-geoglows', 1, 2, 3, 4, 5, 6),
             (101, 'era_interim', 'TEST-geoglows', 11, 21, 101, 501, 1001, 5001),
             (301, 'era_5', 'TEST-other', 1, 2, 3, 4, 5, 6)",
        )
        .expect("Failed to insert test thresholds");

    client
}

fn cleanup_test_data(client: &mut Client) {
    let _ = client.execute("DELETE FROM return_periods WHERE watershed LIKE 'TEST%'", &[]);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Requires a PostgreSQL database
fn test_fetch_return_periods_for_era_and_watershed() {
    let mut client = setup_test_db();

    let table = fetch_return_periods(&mut client, "era_5", "TEST-geoglows")
        .expect("query should succeed");

    assert_eq!(table.len(), 2);
    let t = table.get(101).expect("reach 101 should be present");
    assert_eq!(t.return_2, 10.0);
    assert_eq!(t.return_100, 5000.0);
    assert!(table.get(301).is_none(), "other watershed must not be included");

    cleanup_test_data(&mut client);
}

#[test]
#[ignore] // Requires a PostgreSQL database
fn test_fetch_return_periods_unknown_watershed_is_empty() {
    let mut client = setup_test_db();

    let table = fetch_return_periods(&mut client, "era_5", "TEST-missing")
        .expect("query should succeed");
    assert!(table.is_empty());

    cleanup_test_data(&mut client);
}
