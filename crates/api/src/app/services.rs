//! Backend wiring: which [`Backend`] implementation serves this process.

use std::sync::Arc;

use elecpos_backend::{Backend, MemoryBackend};

/// Shared per-process services handed to every handler.
pub struct AppServices {
    pub backend: Arc<dyn Backend>,
}

impl AppServices {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

pub async fn build_services() -> AppServices {
    let use_postgres = std::env::var("USE_POSTGRES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_postgres {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_services().await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_POSTGRES=true but postgres feature not enabled, falling back to in-memory"
            );
            return build_in_memory_services();
        }
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    AppServices::new(Arc::new(MemoryBackend::new()))
}

#[cfg(feature = "postgres")]
async fn build_postgres_services() -> AppServices {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_POSTGRES=true");
    let backend = elecpos_backend::PostgresBackend::connect(&database_url)
        .await
        .expect("failed to connect to postgres");
    AppServices::new(Arc::new(backend))
}
