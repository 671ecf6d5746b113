use std::sync::Arc;

use cucumber::World;
use fanpush_engine::{
    events::EventProducers,
    test_utils::{prepare_env::create_database, prepare_env::run_migrations, random_db_path, FlakyDatabase},
    Bootstrapper,
    OrderLedgerApi,
    PurchaseResult,
    PushOutcome,
    PushSchedulerApi,
    ScheduleIndex,
    SchedulerError,
    SqliteDatabase,
};
use log::*;

pub type TestDatabase = FlakyDatabase<SqliteDatabase>;

#[derive(Default, Debug, World)]
pub struct PushWorld {
    pub system: Option<PushSystem>,
    pub last_purchase: Option<Result<PurchaseResult, SchedulerError>>,
    pub last_push: Option<Result<PushOutcome, SchedulerError>>,
}

#[derive(Debug)]
pub struct PushSystem {
    pub db_path: String,
    pub db: TestDatabase,
    pub index: Arc<ScheduleIndex>,
    pub ledger: OrderLedgerApi<TestDatabase>,
    pub scheduler: PushSchedulerApi<TestDatabase>,
}

impl PushWorld {
    pub fn system(&self) -> &PushSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut PushSystem {
        self.system.as_mut().expect("System not initialised")
    }

    pub fn pushed(&self) -> &PushOutcome {
        match self.last_push.as_ref().expect("No push was made") {
            Ok(outcome) => outcome,
            Err(e) => panic!("The last push failed: {e}"),
        }
    }

    pub fn push_error(&self) -> &SchedulerError {
        match self.last_push.as_ref().expect("No push was made") {
            Ok(outcome) => panic!("The last push succeeded: {outcome:?}"),
            Err(e) => e,
        }
    }
}

impl PushSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🌍️ Created database: {url}");
        let db = FlakyDatabase::new(db);
        let index = Arc::new(ScheduleIndex::new());
        let ledger = OrderLedgerApi::new(db.clone(), index.clone(), EventProducers::default());
        let scheduler = PushSchedulerApi::new(db.clone(), index.clone(), EventProducers::default());
        Self { db_path: url, db, index, ledger, scheduler }
    }

    /// Throws the in-memory schedule away and rebuilds it from the store, as a restart would.
    pub async fn restart(&mut self) {
        let index = Arc::new(ScheduleIndex::new());
        let loaded = Bootstrapper::new(self.db.clone(), index.clone()).load().await.expect("Bootstrap failed");
        debug!("🌍️ Restarted with {loaded} pending orders");
        self.ledger = OrderLedgerApi::new(self.db.clone(), index.clone(), EventProducers::default());
        self.scheduler = PushSchedulerApi::new(self.db.clone(), index.clone(), EventProducers::default());
        self.index = index;
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
