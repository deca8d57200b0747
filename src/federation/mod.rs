//! ActivityPub federation module
//!
//! Handles:
//! - ActivityStreams documents
//! - Actor key pairs
//! - Payload signing and verification
//! - WebFinger

mod activity;
mod keys;
mod signature;
mod webfinger;

pub use activity::{
    ACTIVITYSTREAMS_CONTEXT, ActivityKind, FALLBACK_ACTIVITY_TYPE, SECURITY_CONTEXT,
    activity_type_of, actor_document, object_activity, object_document, ordered_collection,
};
pub use keys::{
    KEY_BITS, KeyPair, generate_keys, generate_keys_blocking, key_pair_matches,
    public_key_pem_from_private,
};
pub use signature::{PayloadSigner, sign_payload, verify_payload};
pub use webfinger::{
    AcctResource, WebFingerLink, WebFingerResponse, generate_webfinger_response,
    parse_acct_resource,
};
