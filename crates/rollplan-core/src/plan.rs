use serde::{Deserialize, Serialize};

/// Environment variable through which the agent learns the restart stamp.
pub const RESTART_STAMP_ENV: &str = "RESTART_STAMP";

/// One atomic unit of work delivered to a machine's agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: String,
    /// Installer image; empty for commands run directly on the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    /// `host:container` path mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<String>,
}

/// Ordered instructions for one machine, produced by one planning pass.
///
/// Two plans are equal when their instruction lists are element-wise equal.
/// The restart stamp is derived from the instructions and so never decides
/// equality on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePlan {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub restart_stamp: String,
}

impl NodePlan {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instruction(&self, name: &str) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.name == name)
    }
}

impl PartialEq for NodePlan {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions
    }
}

impl Eq for NodePlan {}
