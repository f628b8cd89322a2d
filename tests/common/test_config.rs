use std::env;
use std::future::Future;
use std::io::Write;
use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use crate::common::memory_connection::MemoryConnection;
use envconfig::Envconfig;
use lazy_static::lazy_static;
use log::LevelFilter;
use tokio::runtime::Runtime;
use tokio::sync::RwLock;

lazy_static! {
    pub static ref TEST_CONFIG: RwLock<Option<TestSetupConfig>> = RwLock::new(None);
}

#[derive(Debug, Clone, Envconfig)]
pub struct EnvTestConfig {
    #[envconfig(from = "GEONEAR_COLLECTION_PREFIX", default = "geos_")]
    pub collection_prefix: String,
    #[envconfig(from = "GEONEAR_DEFAULT_NUM", default = "100")]
    pub default_num: usize,
}

#[derive(Debug, Clone)]
pub struct TestSetupConfig {
    pub collection_prefix: String,
    pub default_num: usize,
}

impl TestSetupConfig {
    pub fn context(&self) -> TestContext {
        TestContext {
            connection: Arc::new(MemoryConnection::new(self.default_num)),
            collection_prefix: self.collection_prefix.clone(),
        }
    }
}

/// Per test state. Every test gets its own store.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub connection: Arc<MemoryConnection>,
    pub collection_prefix: String,
}

static RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
});

pub fn run_test<T, Fut>(test: T)
where
    T: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = ()>,
{
    RUNTIME.block_on(async {
        let mut config = TEST_CONFIG.write().await;

        if let Some(setup) = config.deref() {
            let ctx = setup.context();
            drop(config);
            test(ctx).await;
            return;
        }

        env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}:{} {} [{}] - {}",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    record.level(),
                    record.args()
                )
            })
            .filter(Some("reqwest"), LevelFilter::Warn)
            .filter_level(
                env::var("RUST_LOG")
                    .unwrap_or("TRACE".to_string())
                    .parse()
                    .unwrap(),
            )
            .init();

        let setup = create_test_setup();

        *config = Some(setup.clone());
        drop(config);

        test(setup.context()).await;
    });
}

pub fn create_test_setup() -> TestSetupConfig {
    let test_config = EnvTestConfig::init_from_env().unwrap();

    TestSetupConfig {
        collection_prefix: test_config.collection_prefix,
        default_num: test_config.default_num,
    }
}
