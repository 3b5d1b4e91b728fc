//! The closed vocabulary of actions.
//!
//! Most actions are opaque external collaborators (profile generators, sync
//! jobs, the markdown linter) run through the action invoker. `clear-temp`,
//! `git-commit` and `help` are handled in-process.

use std::fmt;
use std::str::FromStr;

/// One named, independently invocable unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    ChessCom,
    Codeforces,
    LeetCode,
    SteamStats,
    YouTube,
    SyncCloud,
    SyncLocal,
    SyncGdocChessCom,
    SyncGdocCodeforces,
    SyncGdocLeetCode,
    SyncGdocSteam,
    SyncGdocYouTube,
    MarkdownLint,
    ClearTemp,
    GenerateAndSyncProfiles,
    GitCommit,
    Perplexity,
    Help,
}

/// Where an action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Subprocess through the action invoker.
    External,
    /// Implemented by the orchestrator itself.
    Native,
}

impl ActionName {
    pub const ALL: [ActionName; 18] = [
        ActionName::ChessCom,
        ActionName::Codeforces,
        ActionName::LeetCode,
        ActionName::SteamStats,
        ActionName::YouTube,
        ActionName::SyncCloud,
        ActionName::SyncLocal,
        ActionName::SyncGdocChessCom,
        ActionName::SyncGdocCodeforces,
        ActionName::SyncGdocLeetCode,
        ActionName::SyncGdocSteam,
        ActionName::SyncGdocYouTube,
        ActionName::MarkdownLint,
        ActionName::ClearTemp,
        ActionName::GenerateAndSyncProfiles,
        ActionName::GitCommit,
        ActionName::Perplexity,
        ActionName::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::ChessCom => "chess-com",
            ActionName::Codeforces => "codeforces",
            ActionName::LeetCode => "leetcode",
            ActionName::SteamStats => "steam-stats",
            ActionName::YouTube => "youtube",
            ActionName::SyncCloud => "sync-cloud",
            ActionName::SyncLocal => "sync-local",
            ActionName::SyncGdocChessCom => "sync-gdoc-chesscom",
            ActionName::SyncGdocCodeforces => "sync-gdoc-codeforces",
            ActionName::SyncGdocLeetCode => "sync-gdoc-leetcode",
            ActionName::SyncGdocSteam => "sync-gdoc-steam",
            ActionName::SyncGdocYouTube => "sync-gdoc-youtube",
            ActionName::MarkdownLint => "markdown-lint",
            ActionName::ClearTemp => "clear-temp",
            ActionName::GenerateAndSyncProfiles => "generate-and-sync-profiles",
            ActionName::GitCommit => "git-commit",
            ActionName::Perplexity => "perplexity",
            ActionName::Help => "help",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionName::ChessCom => "Generate the Chess.com profile",
            ActionName::Codeforces => "Generate the Codeforces profile",
            ActionName::LeetCode => "Generate the LeetCode profile",
            ActionName::SteamStats => "Generate the Steam statistics profile",
            ActionName::YouTube => "Generate the YouTube channel profile",
            ActionName::SyncCloud => "Sync every shared profile to its Google Doc",
            ActionName::SyncLocal => "Copy the shared directory to the local sync directory",
            ActionName::SyncGdocChessCom => "Sync the Chess.com profile to a Google Doc",
            ActionName::SyncGdocCodeforces => "Sync the Codeforces profile to a Google Doc",
            ActionName::SyncGdocLeetCode => "Sync the LeetCode profile to a Google Doc",
            ActionName::SyncGdocSteam => "Sync the Steam profile to a Google Doc",
            ActionName::SyncGdocYouTube => "Sync the YouTube profile to a Google Doc",
            ActionName::MarkdownLint => "Lint the repository's markdown files",
            ActionName::ClearTemp => "Truncate every file in the temp directory except .gitignore",
            ActionName::GenerateAndSyncProfiles => {
                "Generate all profiles and sync them to Google Docs"
            }
            ActionName::GitCommit => "Stage, commit and push using the commit message file",
            ActionName::Perplexity => "Run the Perplexity research job",
            ActionName::Help => "Show this list",
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionName::ClearTemp | ActionName::GitCommit | ActionName::Help => ActionKind::Native,
            _ => ActionKind::External,
        }
    }

    /// Whether the action publishes to the cloud destination and needs a token.
    pub fn touches_cloud(&self) -> bool {
        self.accepts_document_id()
            || matches!(
                self,
                ActionName::SyncCloud | ActionName::GenerateAndSyncProfiles
            )
    }

    /// Whether `--doc-id` is forwarded to this action.
    pub fn accepts_document_id(&self) -> bool {
        matches!(
            self,
            ActionName::SyncGdocChessCom
                | ActionName::SyncGdocCodeforces
                | ActionName::SyncGdocLeetCode
                | ActionName::SyncGdocSteam
                | ActionName::SyncGdocYouTube
        )
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
