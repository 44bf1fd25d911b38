pub use tracing::{debug, info, warn};
