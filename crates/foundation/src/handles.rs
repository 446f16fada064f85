/// Generational slot handle: `(index, generation)`.
///
/// A handle stays valid only while its slot keeps the generation it was issued with;
/// reusing the slot bumps the generation and silently invalidates older copies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle { index, generation }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}
