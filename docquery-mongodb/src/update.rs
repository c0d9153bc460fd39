//! Update translation into MongoDB update operator documents.

use bson::{Bson, Document, doc};

use docquery_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    update::{Update, UpdateVisitor},
};


/// Collects update operations into a single `{ "$set": {..}, "$inc": {..} }` document.
#[derive(Debug, Default)]
pub(crate) struct MongoUpdateTranslator {
    update: Document,
}

impl MongoUpdateTranslator {
    pub fn translate(update: &Update) -> DocumentStoreResult<Document> {
        let mut translator = MongoUpdateTranslator::default();

        for op in update.ops() {
            translator.visit_op(op)?;
        }

        Ok(translator.update)
    }

    fn push(&mut self, operator: &str, field: &str, value: Bson) {
        match self.update.get_mut(operator) {
            Some(Bson::Document(fields)) => {
                fields.insert(field, value);
            },
            _ => {
                self.update.insert(operator, doc! { field: value });
            },
        }
    }
}

impl UpdateVisitor for MongoUpdateTranslator {
    type Output = ();
    type Error = DocumentStoreError;

    fn visit_set(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        self.push("$set", field, value.clone());
        Ok(())
    }

    fn visit_unset(&mut self, field: &str) -> Result<Self::Output, Self::Error> {
        self.push("$unset", field, Bson::String(String::new()));
        Ok(())
    }

    fn visit_inc(&mut self, field: &str, amount: &Bson) -> Result<Self::Output, Self::Error> {
        self.push("$inc", field, amount.clone());
        Ok(())
    }

    fn visit_add_to_set(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        self.push("$addToSet", field, value.clone());
        Ok(())
    }
}
