//! Parameter automation queues, grouped by parameter name.

use alloc::vec::Vec;
use cue_ir::{Event, EventPayload, ParamName};

use crate::event_queue::{OrderedEventQueue, Timed};

/// A queued param event and whether it was already dispatched ahead of time.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamCue {
    pub event: Event,
    /// Dispatched one cycle early as a ramp start; skip it when it arrives.
    pub cued_early: bool,
}

impl ParamCue {
    pub fn new(event: Event) -> Self {
        Self { event, cued_early: false }
    }
}

impl Timed for ParamCue {
    fn position(&self) -> f64 {
        self.event.position
    }
}

/// All queued events for one parameter name.
#[derive(Clone, Debug)]
pub struct ParamGroup {
    pub name: ParamName,
    pub queue: OrderedEventQueue<ParamCue>,
}

/// Param events of a stream, one ordered queue per name.
#[derive(Clone, Debug, Default)]
pub struct ParamGroups {
    groups: Vec<ParamGroup>,
}

impl ParamGroups {
    /// Build from a raw sequence, keeping only param events.
    pub fn from_sequence<'a>(sequence: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut groups = Self::default();
        let mut params: Vec<&Event> = sequence
            .into_iter()
            .filter(|e| matches!(e.payload, EventPayload::Param { .. }))
            .collect();
        params.sort_by(|a, b| a.position.total_cmp(&b.position));
        for event in params {
            groups.push(event.clone());
        }
        groups
    }

    /// Route a param event to its group, creating the group on first use.
    ///
    /// Events that are not params are ignored.
    pub fn push(&mut self, event: Event) {
        let EventPayload::Param { name, .. } = &event.payload else {
            return;
        };
        match self.groups.iter_mut().find(|g| &g.name == name) {
            Some(group) => group.queue.push(ParamCue::new(event)),
            None => {
                let mut queue = OrderedEventQueue::new();
                let name = name.clone();
                queue.push(ParamCue::new(event));
                self.groups.push(ParamGroup { name, queue });
            }
        }
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&ParamGroup> {
        self.groups.iter().find(|g| g.name.as_str() == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut ParamGroup> {
        self.groups.iter_mut().find(|g| g.name.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamGroup> {
        self.groups.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParamGroup> {
        self.groups.iter_mut()
    }

    /// Number of distinct parameter names.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns true if no group has anything left to dispatch.
    pub fn is_drained(&self) -> bool {
        self.groups
            .iter()
            .all(|g| g.queue.iter().all(|cue| cue.cued_early))
    }
}
