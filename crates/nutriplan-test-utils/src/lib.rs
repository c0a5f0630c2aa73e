//! Shared fixtures for nutriplan integration tests.
//!
//! Every test gets its own migrated database on one PostgreSQL server per
//! test binary. The server is the one named by `NUTRIPLAN_TEST_PG_URL`, or
//! a testcontainers instance started on first use.

use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use nutriplan_db::models::{
    ActivityLevel, DietType, Gender, Goal, GoalIntensity, NutritionTotals, Profile, WeekPlan,
};
use nutriplan_db::pool;

struct TestServer {
    /// Server root, no database name.
    url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<TestServer> = OnceCell::const_new();

async fn start_server() -> TestServer {
    if let Ok(url) = std::env::var("NUTRIPLAN_TEST_PG_URL") {
        return TestServer {
            url,
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    TestServer {
        url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Root URL of the test server, starting it on first call.
pub async fn pg_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.url
}

async fn maintenance_pool() -> PgPool {
    pool::connect(&format!("{}/postgres", pg_url().await), 1)
        .await
        .expect("maintenance connection")
}

/// A fresh, migrated database. Returns `(pool, db_name)`; pass `db_name` to
/// [`drop_test_db`] when done.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("nutriplan_test_{}", Uuid::new_v4().simple());
    let maintenance = maintenance_pool().await;
    pool::create_database(&maintenance, &db_name)
        .await
        .expect("create test database");
    maintenance.close().await;

    let db = pool::connect(&format!("{}/{db_name}", pg_url().await), 5)
        .await
        .expect("connect to test database");
    pool::run_migrations(&db).await.expect("migrations should succeed");
    (db, db_name)
}

/// Drop a database made by [`create_test_db`]. Already-dropped is fine.
pub async fn drop_test_db(db_name: &str) {
    let maintenance = maintenance_pool().await;
    pool::drop_database(&maintenance, db_name)
        .await
        .expect("drop test database");
    maintenance.close().await;
}

/// A complete profile: 80 kg male cutting to 72 kg at a balanced pace.
pub fn sample_profile(user_id: &str) -> Profile {
    Profile {
        user_id: user_id.to_owned(),
        name: Some("Asha".to_owned()),
        goal: Some(Goal::Cut),
        goal_intensity: Some(GoalIntensity::Balanced),
        diet_type: Some(DietType::Veg),
        dislikes: Some("mushrooms".to_owned()),
        weight_kg: Some(80.0),
        height_cm: Some(178.0),
        age: Some(30),
        gender: Some(Gender::Male),
        activity_level: Some(ActivityLevel::Moderate),
        tenure_months: Some(4),
        target_weight: Some(72.0),
    }
}

/// A week with two days of meals and fixed totals.
pub fn sample_week(week_number: i32, start_weight_kg: f64, end_weight_kg: f64) -> WeekPlan {
    WeekPlan {
        week_number,
        plan_text: format!(
            "Week {week_number}\n📅 Day 1:\n- Oats with berries\n- Lentil curry\n\
             📅 Day 2:\n- Tofu scramble\n- Paneer wrap"
        ),
        totals: NutritionTotals {
            kcal: 14_000.0,
            protein_g: 1_050.0,
            carbs_g: 1_400.0,
            fat_g: 420.0,
        },
        start_weight_kg,
        end_weight_kg,
        tdee: 2_700.0,
        protein_goal: 160.0,
    }
}

/// `count` contiguous weeks starting at `first`, losing 0.5 kg per week from
/// `start_weight_kg`.
pub fn sample_weeks(first: i32, count: i32, start_weight_kg: f64) -> Vec<WeekPlan> {
    (0..count)
        .map(|i| {
            let start = start_weight_kg - 0.5 * f64::from(i);
            sample_week(first + i, start, start - 0.5)
        })
        .collect()
}
