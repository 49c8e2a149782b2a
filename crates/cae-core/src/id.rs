use slotmap::new_key_type;

new_key_type! {
    /// Identifies a sub-grid embedded in a parent grid's link registry.
    pub struct SubGridId;
}
