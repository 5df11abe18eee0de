//! Canonical, de-duplicated schema store (§3 "SID", "SchemaIR entry", "Schema body").
//!
//! [`SchemaIr`] is populated by [`crate::normalizer::SpecNormalizer`] and
//! consulted by [`crate::validator::Validator`]. See §4.1 for the two-pass
//! pre-seed/seed admission protocol.

mod body;
mod sid;
mod store;

pub use body::{AdditionalProperties, Format, Literal, NumericBound, SchemaBody};
pub use sid::{OptSid, Sid};
pub use store::{IrEntry, IrError, SchemaIr};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_seed_then_seed_round_trips_through_ref_index() {
        let mut ir = SchemaIr::with_capacity(4);
        let pet_sid = ir.pre_seed("#/components/schemas/Pet");

        let mut body = SchemaBody::default();
        body.types = vec!["object".to_string()];
        let concrete = ir.ensure_mapped(None, body).expect("inline admission");
        ir.resolve_pre_seeded("#/components/schemas/Pet", concrete)
            .expect("seed resolves pre-seeded ref");

        assert_eq!(ir.resolve(pet_sid).expect("resolves"), concrete);
        assert_eq!(ir.sid_for_ref("#/components/schemas/Pet"), Some(pet_sid));
    }

    #[test]
    fn ref_not_pre_seeded_is_fatal() {
        let mut ir = SchemaIr::with_capacity(1);
        let err = ir
            .ensure_mapped(Some("#/components/schemas/Missing"), SchemaBody::default())
            .unwrap_err();
        assert!(matches!(err, IrError::RefNotPreSeeded(r) if r == "#/components/schemas/Missing"));
    }

    #[test]
    fn structurally_equal_inline_bodies_share_one_sid() {
        let mut ir = SchemaIr::with_capacity(4);

        let mut a = SchemaBody::default();
        a.types = vec!["integer".to_string()];
        a.minimum = Some(NumericBound {
            value: 0.0,
            exclusive: false,
        });

        let mut b = SchemaBody::default();
        b.types = vec!["integer".to_string()];
        b.minimum = Some(NumericBound {
            value: 0.0,
            exclusive: false,
        });

        let sid_a = ir.ensure_mapped(None, a).expect("admits a");
        let sid_b = ir.ensure_mapped(None, b).expect("admits b");
        assert_eq!(sid_a, sid_b, "structurally equal bodies dedup to one sid");
    }

    #[test]
    fn multiple_of_one_round_trips_through_zero() {
        let mut body = SchemaBody::default();
        body.set_multiple_of(1.0);
        assert_eq!(body.translated_multiple_of, 0.0);
        assert_eq!(body.multiple_of(), None);

        body.set_multiple_of(2.0);
        assert_eq!(body.multiple_of(), Some(2.0));
    }

    #[test]
    fn to_json_renders_ref_as_pointer_object() {
        let mut ir = SchemaIr::with_capacity(2);
        let sid = ir.pre_seed("#/components/schemas/Pet");
        let json = ir.to_json(sid).expect("materializes placeholder ref");
        assert_eq!(json, serde_json::json!({ "$ref": "#/components/schemas/Pet" }));
    }
}
