use crate::Termination;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    CreatingNail(usize),
    Computing(usize),
    Finished(Termination),
}

pub trait Verboser {
    fn verbose(&mut self, message: Message);
}

pub struct Silent;

impl Verboser for Silent {
    fn verbose(&mut self, _: Message) {}
}

impl<V: Verboser + ?Sized> Verboser for &mut V {
    fn verbose(&mut self, message: Message) {
        (**self).verbose(message)
    }
}
