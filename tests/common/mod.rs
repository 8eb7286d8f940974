//! Mock render host for driving a transition group the way a UI framework
//! would: render, mount instances by key, commit, flush.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use spark_transition::{
    Child, Done, Key, Phase, TransitionGroup, TransitionGroupProps, TransitionHooks,
};

pub type Item = Child<String>;

/// Which `will_*` hooks hold their completion instead of finishing at once.
#[derive(Clone, Copy, Default)]
pub struct Timing {
    pub appear: bool,
    pub enter: bool,
    pub leave: bool,
}

impl Timing {
    /// Like the classic todo item: animated enter and leave, instant appear.
    pub fn todo() -> Self {
        Timing {
            appear: false,
            enter: true,
            leave: true,
        }
    }

    pub fn instant() -> Self {
        Timing::default()
    }
}

/// Mounted child with call counters and held completions.
#[derive(Default)]
pub struct Todo {
    pub label: String,
    timing: Timing,
    pending: RefCell<Vec<Done>>,
    pub will_appear: Cell<usize>,
    pub did_appear: Cell<usize>,
    pub will_enter: Cell<usize>,
    pub did_enter: Cell<usize>,
    pub will_leave: Cell<usize>,
    pub did_leave: Cell<usize>,
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl Todo {
    fn hold_or_complete(&self, hold: bool, done: Done) {
        if hold {
            self.pending.borrow_mut().push(done);
        } else {
            done.complete();
        }
    }

    /// Take the held completion for `phase`, if any.
    pub fn take_done(&self, phase: Phase) -> Option<Done> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|d| d.phase() == Some(phase))?;
        Some(pending.remove(index))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl TransitionHooks for Todo {
    fn will_appear(&self, done: Done) {
        bump(&self.will_appear);
        self.hold_or_complete(self.timing.appear, done);
    }

    fn did_appear(&self) {
        bump(&self.did_appear);
    }

    fn will_enter(&self, done: Done) {
        bump(&self.will_enter);
        self.hold_or_complete(self.timing.enter, done);
    }

    fn did_enter(&self) {
        bump(&self.did_enter);
    }

    fn will_leave(&self, done: Done) {
        bump(&self.will_leave);
        self.hold_or_complete(self.timing.leave, done);
    }

    fn did_leave(&self) {
        bump(&self.did_leave);
    }
}

/// Render host owning the mounted children.
pub struct Host {
    pub group: TransitionGroup<Item>,
    timing: Timing,
    instances: HashMap<Key, Rc<Todo>>,
    /// How many times an instance was created per key.
    pub created: HashMap<Key, usize>,
    /// Keys of the last committed render, in order.
    pub rendered: Vec<Key>,
    seen_revision: u64,
}

pub fn items(labels: &[&str]) -> Vec<Item> {
    labels.iter().map(|l| Child::keyed(*l, l.to_string())).collect()
}

impl Host {
    pub fn mount(labels: &[&str], timing: Timing) -> Host {
        let group = TransitionGroup::new(&items(labels), TransitionGroupProps::default());
        let mut host = Host {
            group,
            timing,
            instances: HashMap::new(),
            created: HashMap::new(),
            rendered: Vec::new(),
            seen_revision: 0,
        };
        host.commit();
        host.group.did_mount().expect("fresh group mounts");
        host.sync();
        host
    }

    /// New item list from the owner: render, commit, then run the post-commit work.
    pub fn update(&mut self, labels: &[&str]) {
        self.group.set_children(&items(labels)).expect("group is mounted");
        self.commit();
        self.group.did_update().expect("group is mounted");
        self.flush();
    }

    /// Like `update`, but stop before the post-commit flush.
    pub fn update_without_flush(&mut self, labels: &[&str]) {
        self.group.set_children(&items(labels)).expect("group is mounted");
        self.commit();
        self.group.did_update().expect("group is mounted");
    }

    pub fn flush(&mut self) {
        self.group.commit_queue().flush();
        self.sync();
    }

    /// Complete the held `phase` transition of `label` and re-render if needed.
    pub fn finish(&mut self, label: &str, phase: Phase) {
        let done = self
            .instance(label)
            .and_then(|todo| todo.take_done(phase))
            .unwrap_or_else(|| panic!("{label} has no pending {phase}"));
        done.complete();
        self.sync();
    }

    pub fn instance(&self, label: &str) -> Option<Rc<Todo>> {
        self.instances.get(&Key::from(label)).cloned()
    }

    pub fn rendered_labels(&self) -> Vec<&str> {
        self.rendered.iter().map(Key::as_str).collect()
    }

    pub fn created_count(&self, label: &str) -> usize {
        self.created.get(&Key::from(label)).copied().unwrap_or(0)
    }

    /// Re-render while the group reports internal changes.
    fn sync(&mut self) {
        loop {
            let revision = self.group.revision().get();
            if revision == self.seen_revision {
                break;
            }
            self.seen_revision = revision;
            self.commit();
            self.group.did_update().expect("group is mounted");
            self.group.commit_queue().flush();
        }
    }

    fn commit(&mut self) {
        let output = self.group.render();

        for child in &output.children {
            let timing = self.timing;
            let created = &mut self.created;
            let instance = self.instances.entry(child.key.clone()).or_insert_with(|| {
                *created.entry(child.key.clone()).or_default() += 1;
                Rc::new(Todo {
                    label: child.content.content.clone().unwrap_or_default(),
                    timing,
                    ..Default::default()
                })
            });
            child.handle.bind(instance);
        }

        let live: Vec<Key> = output.keys().cloned().collect();
        self.instances.retain(|key, _| live.contains(key));
        self.rendered = live;
    }
}
