//! Escape promotion
//!
//! A lift flushes the whole local heap to `H` and forgets it:
//!
//! 1. every register `0..=numRegisters` has `global |= local`, `local := false`
//! 2. each occupied site writes one `H` fact per field slot (a wildcard fact
//!    when its type has no known layout)
//! 3. every slot is reset to empty
//!
//! The caller applies its own register update to the builder afterwards.

use crate::errors::Result;
use crate::features::chc::domain::Clause;
use crate::features::heap_model::domain::{AllocationSite, HeapRelations, LocalHeapLayout};
use crate::features::symbolic_state::domain::{vars, HeapSlot, RegisterState, StateBuilder, SymbolicState};
use crate::shared::models::{BoolExpr, BvExpr};

pub struct LiftingEngine<'a> {
    layout: &'a LocalHeapLayout,
    heap: HeapRelations,
    width: u32,
}

impl<'a> LiftingEngine<'a> {
    pub fn new(layout: &'a LocalHeapLayout, width: u32) -> Self {
        Self {
            layout,
            heap: HeapRelations::new(width),
            width,
        }
    }

    /// Steps 1 and 3
    pub fn promote(&self, builder: &mut StateBuilder, num_registers: u32) {
        builder.map_registers(num_registers as usize + 1, |_, reg| {
            RegisterState::new(
                reg.value.clone(),
                reg.high.clone(),
                BoolExpr::ff(),
                reg.global.clone().or(reg.local.clone()),
            )
        });
        builder.set_heap(vec![HeapSlot::empty(self.width); self.layout.size()]);
    }

    /// Step 2 for every site, each fact guarded by `body`
    pub fn flush_all(&self, body: &[BoolExpr], state: &SymbolicState) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        for site in self.layout.sites() {
            clauses.extend(self.flush_site(site, body, state)?);
        }
        Ok(clauses)
    }

    /// Step 2 for one site; nothing is written while its header is free
    pub fn flush_site(
        &self,
        site: &AllocationSite,
        body: &[BoolExpr],
        state: &SymbolicState,
    ) -> Result<Vec<Clause>> {
        let header = state.slot(site.header_slot())?;
        let mut guard = body.to_vec();
        guard.push(header.free.clone().negate());

        let class = self.heap.id(site.class);
        let instance = self.heap.id(site.instance);

        if !site.has_layout() {
            let head = self.heap.h(
                class,
                instance,
                self.heap.var(vars::F),
                BvExpr::zero(self.width),
                BoolExpr::ff(),
                BoolExpr::var(vars::BF),
            );
            return Ok(vec![Clause::rule(guard, head)]);
        }

        let mut clauses = Vec::with_capacity(site.size());
        for (i, (field, _)) in site.fields.iter().enumerate() {
            let slot = state.slot(site.offset + i)?;
            let head = self.heap.h(
                class.clone(),
                instance.clone(),
                self.heap.id(*field),
                slot.cell.value.clone(),
                slot.cell.high.clone(),
                slot.cell.blocked(),
            );
            clauses.push(Clause::rule(guard.clone(), head));
        }
        Ok(clauses)
    }
}
