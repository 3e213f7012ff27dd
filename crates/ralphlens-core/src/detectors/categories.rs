//! Tool-utilisation categories.
//!
//! Rules are evaluated in declared order and the first match wins, so
//! overlapping patterns resolve by declaration order. Shell invocations are
//! matched on their command text, every other tool on its name.

use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::config::{AnalysisConfig, EfficiencyGroup, OTHER_CATEGORY};
use crate::index::ToolInvocation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
    pub percent: f64,
}

/// A group of categories summed for the efficiency view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyBucket {
    pub count: usize,
    pub percent: f64,
}

/// Category counts summed by each rule's `group`. With the default rules:
/// productive is editing + testing, overhead is orientation + env_setup + git,
/// workflow is claiming + closing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Efficiency {
    pub productive: EfficiencyBucket,
    pub overhead: EfficiencyBucket,
    pub workflow: EfficiencyBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub total: usize,
    /// Declared order, then `other`
    pub counts: Vec<CategoryCount>,
    pub efficiency: Efficiency,
}

fn count_of(counts: &[CategoryCount], name: &str) -> usize {
    counts
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.count)
        .unwrap_or(0)
}

fn bucket(
    config: &AnalysisConfig,
    tallies: &[usize],
    total: usize,
    group: EfficiencyGroup,
) -> EfficiencyBucket {
    let count = config
        .categories
        .iter()
        .zip(tallies)
        .filter(|(rule, _)| rule.group == Some(group))
        .map(|(_, count)| count)
        .sum();
    EfficiencyBucket {
        count,
        percent: percent(count, total),
    }
}

impl CategoryBreakdown {
    pub fn count(&self, name: &str) -> usize {
        count_of(&self.counts, name)
    }

    /// Non-empty categories, largest first.
    pub fn ranked(&self) -> Vec<&CategoryCount> {
        let mut ranked: Vec<&CategoryCount> = self.counts.iter().filter(|c| c.count > 0).collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn match_target<'i>(config: &AnalysisConfig, invocation: &ToolInvocation<'i>) -> &'i str {
    if invocation.name == config.tools.shell {
        invocation.command()
    } else {
        invocation.name
    }
}

/// Position of the first matching rule.
fn rule_position(config: &AnalysisConfig, invocation: &ToolInvocation<'_>) -> Option<usize> {
    let target = match_target(config, invocation);
    config.categories.iter().position(|rule| rule.matches(target))
}

/// Category of one invocation; `"other"` when no rule matches.
pub fn classify<'c>(config: &'c AnalysisConfig, invocation: &ToolInvocation<'_>) -> &'c str {
    rule_position(config, invocation)
        .map(|slot| config.categories[slot].name.as_str())
        .unwrap_or(OTHER_CATEGORY)
}

pub fn detect(ctx: &AnalysisContext<'_>) -> CategoryBreakdown {
    let config = ctx.config;
    let mut tallies: Vec<usize> = vec![0; config.categories.len() + 1];

    for invocation in ctx.index.invocations() {
        let slot = rule_position(config, invocation).unwrap_or(config.categories.len());
        tallies[slot] += 1;
    }

    let total: usize = tallies.iter().sum();
    let efficiency = Efficiency {
        productive: bucket(config, &tallies, total, EfficiencyGroup::Productive),
        overhead: bucket(config, &tallies, total, EfficiencyGroup::Overhead),
        workflow: bucket(config, &tallies, total, EfficiencyGroup::Workflow),
    };
    let names = config
        .categories
        .iter()
        .map(|rule| rule.name.as_str())
        .chain(std::iter::once(OTHER_CATEGORY));
    let counts: Vec<CategoryCount> = names
        .zip(tallies)
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
            percent: percent(count, total),
        })
        .collect();

    CategoryBreakdown {
        total,
        counts,
        efficiency,
    }
}
