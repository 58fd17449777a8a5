//! User-assembled pedals.
//!
//! A custom kernel is a series chain of host primitives created by the caller,
//! with pots bound straight to primitive parameters and any number of extra
//! footswitches.

use pedalboard_core::{AudioHost, HostExt, NodeId, ParamKind, Pot, Switch};

use crate::kernel::Control;

/// Kernel for pedals built outside this crate.
#[derive(Debug)]
pub struct CustomKernel {
    name: String,
    nodes: Vec<NodeId>,
    pots: Vec<(Pot, Control)>,
    switches: Vec<Switch>,
    default_bypassed: bool,
}

impl CustomKernel {
    /// Starts building a custom kernel.
    pub fn builder(name: impl Into<String>) -> CustomKernelBuilder {
        CustomKernelBuilder {
            kernel: Self {
                name: name.into(),
                nodes: Vec::new(),
                pots: Vec::new(),
                switches: Vec::new(),
                default_bypassed: true,
            },
        }
    }

    /// Pedal name, used as the preset key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Series primitives in signal order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub(crate) fn default_bypassed(&self) -> bool {
        self.default_bypassed
    }

    pub(crate) fn take_pots(&mut self) -> Vec<(Pot, Control)> {
        std::mem::take(&mut self.pots)
    }

    pub(crate) fn take_switches(&mut self) -> Vec<Switch> {
        std::mem::take(&mut self.switches)
    }

    pub(crate) fn apply(&mut self, host: &mut dyn AudioHost, control: Control, value: f32) {
        match control {
            Control::Param {
                node,
                param,
                scale,
                offset,
            } => host.apply_param(node, param, offset + value * scale),
            other => tracing::debug!(pedal = %self.name, ?other, "custom pedal ignores control"),
        }
    }
}

/// Builder for [`CustomKernel`].
#[derive(Debug)]
pub struct CustomKernelBuilder {
    kernel: CustomKernel,
}

impl CustomKernelBuilder {
    /// Appends a primitive to the series chain.
    #[must_use]
    pub fn node(mut self, node: NodeId) -> Self {
        self.kernel.nodes.push(node);
        self
    }

    /// Adds a pot writing its value straight to `param` on `node`.
    #[must_use]
    pub fn pot(self, pot: Pot, node: NodeId, param: ParamKind) -> Self {
        self.scaled_pot(pot, node, param, 1.0, 0.0)
    }

    /// Adds a pot writing `offset + value·scale` to `param` on `node`.
    #[must_use]
    pub fn scaled_pot(
        mut self,
        pot: Pot,
        node: NodeId,
        param: ParamKind,
        scale: f32,
        offset: f32,
    ) -> Self {
        self.kernel.pots.push((
            pot,
            Control::Param {
                node,
                param,
                scale,
                offset,
            },
        ));
        self
    }

    /// Adds an extra footswitch.
    #[must_use]
    pub fn switch(mut self, switch: Switch) -> Self {
        self.kernel.switches.push(switch);
        self
    }

    /// Sets whether the pedal starts bypassed (default: true).
    #[must_use]
    pub fn bypassed(mut self, bypassed: bool) -> Self {
        self.kernel.default_bypassed = bypassed;
        self
    }

    /// Finishes the kernel.
    pub fn build(self) -> CustomKernel {
        self.kernel
    }
}
