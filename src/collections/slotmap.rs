/// Dense storage whose indices stay valid until released, with freed slots reused.
///
/// Connections are keyed by their slot, so an index names exactly one live
/// connection between `insert` and `release`.
#[derive(Debug)]
pub struct SlotMap<T> {
    head: u32,
    len: usize,
    entries: Vec<Result<T, u32>>,
}
impl<T> SlotMap<T> {
    pub fn new() -> Self {
        Self {
            head: u32::MAX,
            len: 0,
            entries: vec![],
        }
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn get(&mut self, i: usize) -> Option<&mut T> {
        self.entries.get_mut(i).and_then(|r| r.as_mut().ok())
    }
    /// The index the next `insert` will hand out.
    pub fn next_idx(&self) -> usize {
        if self.head == u32::MAX {
            self.entries.len()
        } else {
            self.head as usize
        }
    }
    pub fn insert(&mut self, value: T) -> usize {
        self.len += 1;
        if self.head == u32::MAX {
            let i = self.entries.len();
            self.entries.push(Ok(value));
            i
        } else {
            let id = self.head as usize;
            let slot = &mut self.entries[id];
            match core::mem::replace(slot, Ok(value)) {
                Err(next) => self.head = next,
                Ok(_) => unreachable!("free list points at an occupied slot"),
            }
            id
        }
    }
    pub fn release(&mut self, i: usize) -> Option<T> {
        let head = self.head;
        let slot = self.entries.get_mut(i)?;
        match core::mem::replace(slot, Err(head)) {
            Ok(v) => {
                self.head = i as u32;
                self.len -= 1;
                Some(v)
            }
            Err(next) => {
                *slot = Err(next);
                None
            }
        }
    }
}
impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
