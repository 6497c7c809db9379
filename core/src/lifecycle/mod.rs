//! Provisional-to-committed protocol for fields produced during one ray.
//!
//! Kernel results start out provisional under the base name of the field
//! they were derived from. A provisional is either committed under a final
//! name, which hands it to the ray, or discarded when the ray is finished.
//! Transitions: `absent -> provisional -> committed` and
//! `provisional -> discarded`; nothing leaves a terminal state.

mod handle;

pub use handle::{FieldHandle, FieldState, ProvisionalId};

use std::collections::BTreeMap;

use crate::prelude::{ensure_gates, EditError, EditResult};
use crate::volume::{Field, FieldData};

#[derive(Debug, Clone)]
struct LiveProvisional {
    id: ProvisionalId,
    field: Field,
}

#[derive(Debug, Clone, Default)]
pub struct FieldLifecycle {
    n_gates: usize,
    next_id: u64,
    live: Vec<LiveProvisional>,
    states: BTreeMap<ProvisionalId, FieldState>,
    committed: Vec<Field>,
    staged: Vec<String>,
}

impl FieldLifecycle {
    /// Starts a ray whose existing fields are `committed`.
    pub fn new(n_gates: usize, committed: Vec<Field>) -> Self {
        Self {
            n_gates,
            committed,
            ..Self::default()
        }
    }

    pub fn n_gates(&self) -> usize {
        self.n_gates
    }

    /// Creates or overwrites the live provisional with base name `name`.
    /// When several share the name, the newest one is overwritten.
    pub fn create_provisional(
        &mut self,
        name: &str,
        units: &str,
        missing: f32,
        data: FieldData,
    ) -> EditResult<FieldHandle> {
        let field = self.checked(name, units, missing, data)?;
        if let Some(existing) = self.live.iter_mut().rev().find(|p| p.field.name == name) {
            existing.field = field;
            return Ok(FieldHandle::Provisional(existing.id));
        }
        Ok(self.push_live(field))
    }

    /// Always starts a new provisional, even if one named `name` is live.
    /// Earlier handles keep their own data; the name resolves to the newest.
    pub fn create_fresh(
        &mut self,
        name: &str,
        units: &str,
        missing: f32,
        data: FieldData,
    ) -> EditResult<FieldHandle> {
        let field = self.checked(name, units, missing, data)?;
        Ok(self.push_live(field))
    }

    /// Overwrites the live provisional `target` refers to, keeping its
    /// handle. A target that resolves to a committed field starts a new
    /// provisional named `name` instead.
    pub fn rewrite(
        &mut self,
        target: &FieldHandle,
        name: &str,
        units: &str,
        missing: f32,
        data: FieldData,
    ) -> EditResult<FieldHandle> {
        let field = self.checked(name, units, missing, data)?;
        let live = match target {
            FieldHandle::Provisional(id) => self.live.iter_mut().find(|p| p.id == *id),
            FieldHandle::Committed(base) => {
                self.live.iter_mut().rev().find(|p| p.field.name == *base)
            }
        };
        match live {
            Some(existing) => {
                existing.field = field;
                Ok(FieldHandle::Provisional(existing.id))
            }
            None => Ok(self.push_live(field)),
        }
    }

    /// Looks up the field a handle refers to. A committed name resolves to a
    /// live provisional of the same base name first.
    pub fn resolve(&self, handle: &FieldHandle) -> EditResult<&Field> {
        match handle {
            FieldHandle::Provisional(id) => self
                .live
                .iter()
                .find(|p| p.id == *id)
                .map(|p| &p.field)
                .ok_or_else(|| EditError::StaleHandle(self.describe(*id))),
            FieldHandle::Committed(name) => self
                .live
                .iter()
                .rev()
                .find(|p| p.field.name == *name)
                .map(|p| &p.field)
                .or_else(|| self.committed.iter().find(|f| f.name == *name))
                .ok_or_else(|| EditError::FieldNotFound(name.clone())),
        }
    }

    /// Renames the provisional to `final_name` and moves it into the
    /// committed set, replacing any committed field of that name.
    pub fn commit(&mut self, id: ProvisionalId, final_name: &str) -> EditResult<Field> {
        let position = self
            .live
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EditError::StaleHandle(self.describe(id)))?;
        let mut field = self.live.remove(position).field;
        field.name = final_name.to_string();
        self.states.insert(id, FieldState::Committed);
        self.install(field.clone());
        Ok(field)
    }

    /// Commits a copy of an existing field under `new_name`.
    pub fn duplicate(&mut self, source: &FieldHandle, new_name: &str) -> EditResult<Field> {
        let mut field = self.resolve(source)?.clone();
        field.name = new_name.to_string();
        self.install(field.clone());
        Ok(field)
    }

    /// Drops every live provisional, returning how many were discarded.
    pub fn discard_uncommitted(&mut self) -> usize {
        let discarded = self.live.len();
        for provisional in self.live.drain(..) {
            self.states.insert(provisional.id, FieldState::Discarded);
        }
        discarded
    }

    pub fn state(&self, id: ProvisionalId) -> Option<FieldState> {
        self.states.get(&id).copied()
    }

    pub fn committed(&self) -> &[Field] {
        &self.committed
    }

    /// Fields committed since this lifecycle was created, in commit order.
    pub fn staged(&self) -> impl Iterator<Item = &Field> {
        self.staged
            .iter()
            .filter_map(|name| self.committed.iter().find(|f| &f.name == name))
    }

    fn checked(&self, name: &str, units: &str, missing: f32, data: FieldData) -> EditResult<Field> {
        ensure_gates(name, self.n_gates, data.len())?;
        Ok(Field {
            name: name.to_string(),
            units: units.to_string(),
            missing,
            data,
        })
    }

    fn push_live(&mut self, field: Field) -> FieldHandle {
        let id = ProvisionalId(self.next_id);
        self.next_id += 1;
        self.live.push(LiveProvisional { id, field });
        self.states.insert(id, FieldState::Provisional);
        FieldHandle::Provisional(id)
    }

    fn install(&mut self, field: Field) {
        if !self.staged.contains(&field.name) {
            self.staged.push(field.name.clone());
        }
        match self.committed.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.committed.push(field),
        }
    }

    fn describe(&self, id: ProvisionalId) -> String {
        match self.state(id) {
            Some(state) => format!("provisional #{} is {:?}", id.0, state),
            None => format!("provisional #{} was never created", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> FieldLifecycle {
        FieldLifecycle::new(3, vec![Field::values("VEL", "m/s", -9999.0, vec![1.0, 2.0, 3.0])])
    }

    fn values(v: &[f32]) -> FieldData {
        FieldData::Values(v.to_vec())
    }

    #[test]
    fn round_trip_commits_the_last_written_values() {
        let mut lc = lifecycle();
        let handle = lc
            .create_provisional("VEL", "m/s", -9999.0, values(&[4.0, 5.0, 6.0]))
            .unwrap();
        assert_eq!(
            lc.resolve(&FieldHandle::committed("VEL")).unwrap().as_values().unwrap(),
            &[4.0, 5.0, 6.0]
        );

        let again = lc
            .create_provisional("VEL", "m/s", -9999.0, values(&[7.0, 8.0, 9.0]))
            .unwrap();
        assert_eq!(handle, again);

        let id = handle.provisional_id().unwrap();
        let committed = lc.commit(id, "VEL_UNF").unwrap();
        assert_eq!(committed.name, "VEL_UNF");
        assert_eq!(committed.as_values().unwrap(), &[7.0, 8.0, 9.0]);
        assert_eq!(lc.state(id), Some(FieldState::Committed));
        assert_eq!(lc.staged().count(), 1);
        // the source field is untouched
        assert_eq!(
            lc.resolve(&FieldHandle::committed("VEL")).unwrap().as_values().unwrap(),
            &[1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn terminal_states_reject_further_commits() {
        let mut lc = lifecycle();
        let first = lc
            .create_provisional("A", "", -9999.0, values(&[0.0; 3]))
            .unwrap()
            .provisional_id()
            .unwrap();
        lc.commit(first, "A").unwrap();
        assert!(matches!(lc.commit(first, "B"), Err(EditError::StaleHandle(_))));

        let second = lc
            .create_provisional("C", "", -9999.0, values(&[0.0; 3]))
            .unwrap()
            .provisional_id()
            .unwrap();
        assert_eq!(lc.discard_uncommitted(), 1);
        assert_eq!(lc.state(second), Some(FieldState::Discarded));
        assert!(matches!(
            lc.resolve(&FieldHandle::Provisional(second)),
            Err(EditError::StaleHandle(_))
        ));
    }

    #[test]
    fn wrong_length_and_unknown_names_fail() {
        let mut lc = lifecycle();
        assert_eq!(
            lc.create_provisional("X", "", -9999.0, values(&[1.0])).unwrap_err(),
            EditError::mismatch("X", 3, 1)
        );
        assert!(matches!(
            lc.resolve(&FieldHandle::committed("DBZ")),
            Err(EditError::FieldNotFound(_))
        ));
    }

    #[test]
    fn fresh_provisionals_keep_their_own_data() {
        let mut lc = lifecycle();
        let high = lc
            .create_fresh("MASK", "", -9999.0, FieldData::Flags(vec![false, true, true]))
            .unwrap();
        let low = lc
            .create_fresh("MASK", "", -9999.0, FieldData::Flags(vec![true, false, false]))
            .unwrap();
        assert_ne!(high, low);
        assert_eq!(lc.resolve(&high).unwrap().as_flags().unwrap(), &[false, true, true]);
        // the name follows the newest
        assert_eq!(
            lc.resolve(&FieldHandle::committed("MASK")).unwrap().as_flags().unwrap(),
            &[true, false, false]
        );

        let rewritten = lc
            .rewrite(&high, "MASK", "", -9999.0, FieldData::Flags(vec![true, true, true]))
            .unwrap();
        assert_eq!(rewritten, high);
        assert_eq!(lc.resolve(&low).unwrap().as_flags().unwrap(), &[true, false, false]);

        let from_committed = lc
            .rewrite(&FieldHandle::committed("VEL"), "VEL", "m/s", -9999.0, values(&[0.0; 3]))
            .unwrap();
        assert!(from_committed.provisional_id().is_some());
        assert_eq!(lc.discard_uncommitted(), 3);
    }

    #[test]
    fn duplicate_copies_under_a_new_name() {
        let mut lc = lifecycle();
        lc.duplicate(&FieldHandle::committed("VEL"), "VEL_COPY").unwrap();
        let names: Vec<&str> = lc.staged().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["VEL_COPY"]);
        assert_eq!(lc.committed().len(), 2);
    }
}
