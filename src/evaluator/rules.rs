//! Ordered intent rule table
//!
//! Declaration order IS the priority order: the first rule whose keyword
//! set matches the (lowercased) utterance wins. Escalation sits first so
//! complaint wording that also mentions orders or refunds still escalates;
//! shipping sits above order-status so "where is my order" reads as a
//! delivery question rather than a generic order lookup.

/// Classified purpose of a customer utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Escalation,
    Refund,
    Shipping,
    OrderStatus,
    StoreHours,
    Fallback,
}

/// One entry in the priority-ordered rule table
pub(crate) struct ReplyRule {
    pub intent: Intent,
    /// Case-insensitive substrings; any hit matches the rule.
    pub keywords: &'static [&'static str],
    /// Whether a match requests a human handoff. The evaluator ORs this
    /// into the context, so no rule can ever clear the flag.
    pub escalates: bool,
    pub reply: &'static str,
    pub follow_ups: &'static [&'static str],
}

impl ReplyRule {
    pub(crate) fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|kw| normalized.contains(kw))
    }
}

pub(crate) const RULES: &[ReplyRule] = &[
    ReplyRule {
        intent: Intent::Escalation,
        keywords: &[
            "manager",
            "supervisor",
            "human",
            "real person",
            "representative",
            "complaint",
            "complain",
            "unacceptable",
            "ridiculous",
        ],
        escalates: true,
        reply: "I'm sorry this has been frustrating. I've flagged this call for a \
                support supervisor, and someone will join as soon as one is free. \
                I'm happy to keep helping in the meantime.",
        follow_ups: &["How long until a supervisor is available?"],
    },
    ReplyRule {
        intent: Intent::Refund,
        keywords: &["refund", "return", "money back", "exchange", "send it back"],
        escalates: false,
        reply: "You can return any item within 30 days of delivery for a full \
                refund. I can email you a prepaid return label — refunds post \
                3-5 business days after the carrier scans the package.",
        follow_ups: &[
            "Can you email me a return label?",
            "When will my refund arrive?",
        ],
    },
    ReplyRule {
        intent: Intent::Shipping,
        keywords: &[
            "where is my order",
            "where's my order",
            "shipping",
            "shipped",
            "delivery",
            "deliver",
            "track",
            "package",
        ],
        escalates: false,
        reply: "Let me check on that shipment. Standard delivery runs 3-5 \
                business days from the ship date, and the tracking link in your \
                confirmation email updates every few hours.",
        follow_ups: &[
            "Can I change my delivery address?",
            "What if my package is marked delivered but missing?",
        ],
    },
    ReplyRule {
        intent: Intent::OrderStatus,
        keywords: &["order", "status", "purchase", "bought", "placed"],
        escalates: false,
        reply: "I've pulled up your recent orders on the panel beside this chat. \
                Each one shows its current status; let me know which order you'd \
                like to dig into.",
        follow_ups: &["Can I cancel an order that hasn't shipped?"],
    },
    ReplyRule {
        intent: Intent::StoreHours,
        keywords: &["hours", "open", "closed", "holiday"],
        escalates: false,
        reply: "Phone and chat support are available 8am to 8pm Eastern, seven \
                days a week, including most holidays.",
        follow_ups: &[],
    },
];

/// Defined catch-all: valid input never fails to classify.
pub(crate) const FALLBACK: ReplyRule = ReplyRule {
    intent: Intent::Fallback,
    keywords: &[],
    escalates: false,
    reply: "I want to make sure I get this right — could you tell me a bit more \
            about what you need help with? I can look into orders, shipping, \
            returns, and refunds.",
    follow_ups: &[],
};
