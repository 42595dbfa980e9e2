pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod signed_envelope_datasource;
    }
    pub(crate) mod decoders {
        pub(crate) mod der_reader;
        pub(crate) mod field_extractor;
        pub(crate) mod purchase_record_decoder;
        pub(crate) mod receipt_payload_decoder;
        pub(crate) mod utils;
    }
    pub(crate) mod models {
        pub(crate) mod pkcs7 {
            pub(crate) mod certificate_model;
            pub(crate) mod signed_envelope_model;
            pub(crate) mod signer_info_model;
        }
        pub(crate) mod receipt_payload {
            pub(crate) mod receipt_attribute_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod receipt_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod purchase_record;
        pub mod receipt;
        pub mod trust_anchor;
    }
    pub mod repositories {
        pub mod receipt_repository;
    }
}

pub mod config;
mod constants;
pub mod errors;
pub mod util;
