//! Stage order for deployment and removal.
//!
//! Each stage completes before the next starts. Deploy creates
//! dependencies first; removal tears dependents down first.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployStage {
    Packages,
    Functions,
    Sequences,
    Routes,
    Triggers,
    Feeds,
    Rules,
    ServiceBindings,
}

impl DeployStage {
    pub const ORDER: [DeployStage; 8] = [
        DeployStage::Packages,
        DeployStage::Functions,
        DeployStage::Sequences,
        DeployStage::Routes,
        DeployStage::Triggers,
        DeployStage::Feeds,
        DeployStage::Rules,
        DeployStage::ServiceBindings,
    ];

    pub fn progress(self) -> &'static str {
        match self {
            DeployStage::Packages => "Deploying Packages...",
            DeployStage::Functions => "Deploying Functions...",
            DeployStage::Sequences => "Deploying Sequences...",
            DeployStage::Routes => "Deploying API Gateway definitions...",
            DeployStage::Triggers => "Deploying Triggers...",
            DeployStage::Feeds => "Binding Feeds To Triggers...",
            DeployStage::Rules => "Deploying Rules...",
            DeployStage::ServiceBindings => "Configuring Service Bindings...",
        }
    }
}

impl Display for DeployStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeployStage::Packages => "packages",
            DeployStage::Functions => "functions",
            DeployStage::Sequences => "sequences",
            DeployStage::Routes => "routes",
            DeployStage::Triggers => "triggers",
            DeployStage::Feeds => "feeds",
            DeployStage::Rules => "rules",
            DeployStage::ServiceBindings => "service-bindings",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalStage {
    Routes,
    Rules,
    Functions,
    Packages,
    Triggers,
    Feeds,
}

impl RemovalStage {
    pub const ORDER: [RemovalStage; 6] = [
        RemovalStage::Routes,
        RemovalStage::Rules,
        RemovalStage::Functions,
        RemovalStage::Packages,
        RemovalStage::Triggers,
        RemovalStage::Feeds,
    ];

    pub fn progress(self) -> &'static str {
        match self {
            RemovalStage::Routes => "Removing API Gateway definitions...",
            RemovalStage::Rules => "Removing Rules...",
            RemovalStage::Functions => "Removing Functions...",
            RemovalStage::Packages => "Removing Packages...",
            RemovalStage::Triggers => "Removing Triggers...",
            RemovalStage::Feeds => "Removing Feeds...",
        }
    }

    /// Operation named in removal failure messages.
    pub fn operation(self) -> &'static str {
        match self {
            RemovalStage::Routes => "unbind API Gateway routes",
            RemovalStage::Rules => "delete rule",
            RemovalStage::Functions => "delete function",
            RemovalStage::Packages => "delete package",
            RemovalStage::Triggers => "delete event trigger",
            RemovalStage::Feeds => "remove feed",
        }
    }
}

impl Display for RemovalStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RemovalStage::Routes => "routes",
            RemovalStage::Rules => "rules",
            RemovalStage::Functions => "functions",
            RemovalStage::Packages => "packages",
            RemovalStage::Triggers => "triggers",
            RemovalStage::Feeds => "feeds",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position<T: PartialEq>(order: &[T], stage: T) -> usize {
        order.iter().position(|s| *s == stage).unwrap()
    }

    #[test]
    fn test_deploy_creates_dependencies_first() {
        let order = DeployStage::ORDER;
        assert!(position(&order, DeployStage::Packages) < position(&order, DeployStage::Functions));
        assert!(position(&order, DeployStage::Functions) < position(&order, DeployStage::Sequences));
        assert!(position(&order, DeployStage::Sequences) < position(&order, DeployStage::Routes));
        assert!(position(&order, DeployStage::Triggers) < position(&order, DeployStage::Feeds));
        assert!(position(&order, DeployStage::Feeds) < position(&order, DeployStage::Rules));
        assert_eq!(order.last(), Some(&DeployStage::ServiceBindings));
    }

    #[test]
    fn test_removal_tears_down_dependents_first() {
        let order = RemovalStage::ORDER;
        assert!(position(&order, RemovalStage::Rules) < position(&order, RemovalStage::Functions));
        assert!(position(&order, RemovalStage::Rules) < position(&order, RemovalStage::Triggers));
        assert!(position(&order, RemovalStage::Functions) < position(&order, RemovalStage::Packages));
        assert_eq!(order[0], RemovalStage::Routes);
    }
}
