#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod store;

pub mod model {
    pub use quadcache_model::*;
}

pub mod common {
    pub use quadcache_common::*;
}

pub mod engine {
    pub use quadcache_engine::*;
}

pub mod storage {
    pub use quadcache_storage::*;
}
