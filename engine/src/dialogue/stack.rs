//! Frame stack and closed-frame history

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::frame::DialogueFrame;

/// LIFO of active frames; the root frame is never removed
#[derive(Debug, Clone)]
pub struct DialogueStack {
    frames: Vec<DialogueFrame>,
    max_depth: usize,
}

impl DialogueStack {
    pub fn new(root: DialogueFrame, max_depth: usize) -> Self {
        Self {
            frames: vec![root],
            max_depth: max_depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.max_depth
    }

    pub fn top(&self) -> &DialogueFrame {
        // frames is never empty
        &self.frames[self.frames.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut DialogueFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn root(&self) -> &DialogueFrame {
        &self.frames[0]
    }

    pub fn root_mut(&mut self) -> &mut DialogueFrame {
        &mut self.frames[0]
    }

    /// Push a frame; hands it back when the stack is full
    pub fn push(&mut self, frame: DialogueFrame) -> Result<(), DialogueFrame> {
        if self.is_full() {
            return Err(frame);
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the top frame unless it is the root
    pub fn pop(&mut self) -> Option<DialogueFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Pop every frame above the root, top first
    pub fn unwind(&mut self) -> Vec<DialogueFrame> {
        let mut popped = Vec::with_capacity(self.frames.len() - 1);
        while let Some(frame) = self.pop() {
            popped.push(frame);
        }
        popped
    }

    /// Frames bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &DialogueFrame> {
        self.frames.iter()
    }
}

/// FIFO-capped log of frames that were popped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: VecDeque<DialogueFrame>,
    limit: usize,
}

impl ConversationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, frame: DialogueFrame) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &DialogueFrame> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&DialogueFrame> {
        self.entries.back()
    }

    /// Replace the entries, keeping the newest ones under the limit
    pub fn restore(&mut self, frames: Vec<DialogueFrame>) {
        self.entries.clear();
        for frame in frames {
            self.push(frame);
        }
    }

    pub fn to_vec(&self) -> Vec<DialogueFrame> {
        self.entries.iter().cloned().collect()
    }
}
