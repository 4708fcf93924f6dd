mod reconciler;

pub use reconciler::{ReconcileReport, SchemaReconciler};
