//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `kv`           | StoragePort        | in-memory key-value store     |
//! |                | ConfigPort         |                               |
//! | `local_store`  | LocalPetStore      | any StoragePort (postcard)    |
//! | `remote`       | RemoteStore        | in-memory document store      |
//! | `identity`     | IdentityPort       | login flow                    |
//! | `clock`        | Clock              | host wall clock / manual      |
//! | `sensor`       | StepSensor         | cumulative step counter       |
//! | `log_sink`     | EventSink          | `log` facade                  |
//! | `notify`       | EventSink          | any Notifier                  |
//! |                | Notifier           | `log` facade                  |

pub mod clock;
pub mod identity;
pub mod kv;
pub mod local_store;
pub mod log_sink;
pub mod notify;
pub mod remote;
pub mod sensor;
