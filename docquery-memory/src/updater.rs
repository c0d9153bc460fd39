//! Application of update operations to in-memory documents.

use bson::{Bson, Decimal128, Document};

use docquery_core::{
    document::DocumentPath,
    error::{DocumentStoreError, DocumentStoreResult},
    update::{Update, UpdateVisitor},
};

use crate::evaluator::{values_equal, Number};


/// Applies update operations to one document, reporting whether its content changed.
pub(crate) struct DocumentUpdater<'a> {
    document: &'a mut Document,
}

impl<'a> DocumentUpdater<'a> {
    pub fn new(document: &'a mut Document) -> Self {
        Self { document }
    }

    /// Applies every operation of `update` in order.
    ///
    /// The document is only written when every operation succeeds.
    pub fn apply(document: &mut Document, update: &Update) -> DocumentStoreResult<bool> {
        let mut working = document.clone();
        let mut updater = DocumentUpdater::new(&mut working);
        let mut changed = false;

        for op in update.ops() {
            changed |= updater.visit_op(op)?;
        }

        if changed {
            *document = working;
        }

        Ok(changed)
    }
}

impl<'a> UpdateVisitor for DocumentUpdater<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_set(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        let previous = self.document.set_path(field, value.clone())?;

        Ok(previous.as_ref() != Some(value))
    }

    fn visit_unset(&mut self, field: &str) -> Result<Self::Output, Self::Error> {
        Ok(self.document.remove_path(field).is_some())
    }

    fn visit_inc(&mut self, field: &str, amount: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(current) = self.document.lookup_path(field) else {
            self.document.set_path(field, amount.clone())?;
            return Ok(true);
        };

        let sum = add_numbers(current, amount)?;
        let changed = current != &sum;

        self.document.set_path(field, sum)?;

        Ok(changed)
    }

    fn visit_add_to_set(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        let mut items = match self.document.lookup_path(field) {
            None => Vec::new(),
            Some(Bson::Array(items)) => {
                if items.iter().any(|item| values_equal(item, value)) {
                    return Ok(false);
                }
                items.clone()
            },
            Some(other) => {
                return Err(DocumentStoreError::invalid_operation(format!(
                    "cannot add to set on non-array field '{}' of type {:?}",
                    field,
                    other.element_type()
                )));
            },
        };

        items.push(value.clone());
        self.document.set_path(field, Bson::Array(items))?;

        Ok(true)
    }
}

/// Adds two numbers. `Int32 + Int32` stays `Int32` until it overflows into
/// `Int64`. A `Decimal128` operand yields a `Decimal128`, otherwise any
/// `Double` operand yields a `Double`.
fn add_numbers(current: &Bson, amount: &Bson) -> DocumentStoreResult<Bson> {
    let overflow = || DocumentStoreError::invalid_operation("integer overflow in increment");

    match (current, amount) {
        (Bson::Int32(a), Bson::Int32(b)) => Ok(
            a.checked_add(*b)
                .map(Bson::Int32)
                .unwrap_or(Bson::Int64(*a as i64 + *b as i64))
        ),
        (Bson::Int32(a), Bson::Int64(b)) => (*a as i64).checked_add(*b).map(Bson::Int64).ok_or_else(overflow),
        (Bson::Int64(a), Bson::Int32(b)) => a.checked_add(*b as i64).map(Bson::Int64).ok_or_else(overflow),
        (Bson::Int64(a), Bson::Int64(b)) => a.checked_add(*b).map(Bson::Int64).ok_or_else(overflow),
        (a, b) => match (Number::from_bson(a), Number::from_bson(b)) {
            (Some(x), Some(y)) if matches!(a, Bson::Decimal128(_)) || matches!(b, Bson::Decimal128(_)) => {
                let sum = x.as_f64() + y.as_f64();

                sum.to_string()
                    .parse::<Decimal128>()
                    .map(Bson::Decimal128)
                    .map_err(|_| DocumentStoreError::invalid_operation(format!("{} is not a valid decimal", sum)))
            },
            (Some(x), Some(y)) => Ok(Bson::Double(x.as_f64() + y.as_f64())),
            _ => Err(DocumentStoreError::invalid_operation(format!(
                "cannot increment a value of type {:?} by {:?}",
                current.element_type(),
                amount.element_type()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docquery_core::update::Updates;

    #[test]
    fn set_reports_change_only_for_new_content() {
        let mut document = doc! { "_id": "Klavier", "preis": 3000 };

        assert!(DocumentUpdater::apply(&mut document, &Updates::set("preis", 3800)).unwrap());
        assert!(!DocumentUpdater::apply(&mut document, &Updates::set("preis", 3800)).unwrap());
        assert_eq!(document.get_i32("preis").unwrap(), 3800);
    }

    #[test]
    fn set_creates_missing_parents() {
        let mut document = doc! { "_id": "Geige" };

        DocumentUpdater::apply(&mut document, &Updates::set("hersteller.land", "Italien")).unwrap();

        assert_eq!(document, doc! { "_id": "Geige", "hersteller": { "land": "Italien" } });
    }

    #[test]
    fn unset_missing_field_is_unchanged() {
        let mut document = doc! { "_id": "Geige", "preis": 1200 };

        assert!(!DocumentUpdater::apply(&mut document, &Updates::unset("seiten")).unwrap());
        assert!(DocumentUpdater::apply(&mut document, &Updates::unset("preis")).unwrap());
        assert_eq!(document, doc! { "_id": "Geige" });
    }

    #[test]
    fn inc_widens_and_creates() {
        let mut document = doc! { "_id": "Klavier", "bestand": i32::MAX, "preis": 10 };

        DocumentUpdater::apply(&mut document, &Updates::inc("bestand", 1)).unwrap();
        DocumentUpdater::apply(&mut document, &Updates::inc("preis", 0.5)).unwrap();
        DocumentUpdater::apply(&mut document, &Updates::inc("verkauft", 2)).unwrap();

        assert_eq!(document.get("bestand"), Some(&Bson::Int64(i32::MAX as i64 + 1)));
        assert_eq!(document.get("preis"), Some(&Bson::Double(10.5)));
        assert_eq!(document.get("verkauft"), Some(&Bson::Int32(2)));
    }

    #[test]
    fn inc_on_decimal_stays_decimal() {
        let decimal = |text: &str| Bson::Decimal128(text.parse::<Decimal128>().unwrap());
        let mut document = doc! { "_id": "Klavier", "preis": decimal("3800") };

        assert!(DocumentUpdater::apply(&mut document, &Updates::inc("preis", 200)).unwrap());
        assert_eq!(document.get("preis"), Some(&decimal("4000")));

        let mut document = doc! { "_id": "Geige", "preis": 1200 };

        DocumentUpdater::apply(&mut document, &Updates::inc("preis", decimal("0.5"))).unwrap();
        assert_eq!(document.get("preis"), Some(&decimal("1200.5")));
    }

    #[test]
    fn inc_by_zero_is_unchanged() {
        let mut document = doc! { "_id": "Klavier", "preis": 3000 };

        assert!(!DocumentUpdater::apply(&mut document, &Updates::inc("preis", 0)).unwrap());
    }

    #[test]
    fn inc_on_text_is_rejected() {
        let mut document = doc! { "_id": "Klavier", "kategorie": "Instrumente" };

        let result = DocumentUpdater::apply(&mut document, &Updates::inc("kategorie", 1));

        assert!(matches!(result, Err(DocumentStoreError::InvalidOperation(_))));
    }

    #[test]
    fn add_to_set_skips_present_values() {
        let mut document = doc! { "_id": "Noten", "schlagworte": ["buch", "weihnachten"] };

        assert!(!DocumentUpdater::apply(&mut document, &Updates::add_to_set("schlagworte", "buch")).unwrap());
        assert!(DocumentUpdater::apply(&mut document, &Updates::add_to_set("schlagworte", "chor")).unwrap());
        assert_eq!(
            document.get_array("schlagworte").unwrap(),
            &vec![Bson::from("buch"), Bson::from("weihnachten"), Bson::from("chor")]
        );
    }

    #[test]
    fn add_to_set_creates_array() {
        let mut document = doc! { "_id": "Noten" };

        assert!(DocumentUpdater::apply(&mut document, &Updates::add_to_set("schlagworte", "buch")).unwrap());
        assert_eq!(document, doc! { "_id": "Noten", "schlagworte": ["buch"] });
    }

    #[test]
    fn failed_operation_leaves_document_untouched() {
        let mut document = doc! { "_id": "Noten", "preis": 12, "schlagworte": "buch" };
        let update = Updates::set("preis", 15).and(Updates::add_to_set("schlagworte", "chor"));

        let result = DocumentUpdater::apply(&mut document, &update);

        assert!(matches!(result, Err(DocumentStoreError::InvalidOperation(_))));
        assert_eq!(document.get_i32("preis").unwrap(), 12);
    }
}
