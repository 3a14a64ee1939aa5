//! Scripted financial assistant
//!
//! Queries are matched against a fixed keyword list. Financial queries get
//! a canned reply for their topic; anything else is refused with a pointer
//! to the admin request flow.

use serde::Serialize;

const FINANCIAL_KEYWORDS: &[&str] = &[
    "invest", "mutual fund", "stock", "share", "tax", "gst", "savings", "fd", "rd",
    "interest", "portfolio", "return", "nifty", "sensex", "gold", "silver", "market",
    "capital", "gain", "loss", "dividend", "bond", "insurance", "pension", "retirement",
    "budget", "expense", "income", "salary", "deduction", "80c", "80d", "section", "emi",
    "loan", "credit", "debit", "bank", "account", "balance", "transaction", "profit",
    "asset", "liability", "equity", "debt", "fund", "sip", "nps", "epf", "ppf", "huf", "tds",
    "itr", "gstr", "bill", "payment", "upi", "money", "rupee", "inr", "financial", "finance",
    "wealth", "rich", "poor", "afford", "spend", "save", "earn", "price", "rate", "cost",
    "fee", "charge", "how much", "calculate", "advice", "suggest", "recommend", "best",
    "compare",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    MutualFunds,
    Tax,
    Stocks,
    Deposits,
    General,
}

impl Topic {
    fn reply(&self) -> &'static str {
        match self {
            Topic::MutualFunds => MUTUAL_FUNDS_REPLY,
            Topic::Tax => TAX_REPLY,
            Topic::Stocks => STOCKS_REPLY,
            Topic::Deposits => DEPOSITS_REPLY,
            Topic::General => GENERAL_REPLY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    pub financial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    pub reply: &'static str,
}

/// Case-insensitive substring match on the keyword list
pub fn is_financial_query(query: &str) -> bool {
    let query = query.to_lowercase();
    FINANCIAL_KEYWORDS
        .iter()
        .any(|keyword| query.contains(keyword))
}

/// First matching topic wins
pub fn topic_for(query: &str) -> Topic {
    let query = query.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| query.contains(w));

    if mentions(&["mutual fund", "sip"]) {
        Topic::MutualFunds
    } else if mentions(&["tax", "80c", "deduction"]) {
        Topic::Tax
    } else if mentions(&["stock", "share", "market"]) {
        Topic::Stocks
    } else if mentions(&["fd", "rd", "fixed deposit"]) {
        Topic::Deposits
    } else {
        Topic::General
    }
}

pub fn respond(query: &str) -> AssistantReply {
    if !is_financial_query(query) {
        return AssistantReply {
            financial: false,
            topic: None,
            reply: REFUSAL_REPLY,
        };
    }

    let topic = topic_for(query);
    AssistantReply {
        financial: true,
        topic: Some(topic),
        reply: topic.reply(),
    }
}

/// Message of the admin request raised when the assistant cannot help
pub fn escalation_message(last_query: Option<&str>) -> String {
    let query = last_query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or("N/A");
    format!(
        "User needs assistance beyond AI capabilities. Last query: \"{}\"",
        query
    )
}

const MUTUAL_FUNDS_REPLY: &str = "**Mutual Fund Investment Advice:**

**For Beginners (Low Risk):**
- Index Funds tracking Nifty 50 (expense ratio < 0.5%)
- Liquid Funds for an emergency corpus

**For Moderate Risk:**
- Large Cap Funds
- Balanced Advantage Funds for automatic equity-debt allocation

**For Aggressive Investors:**
- Mid Cap & Small Cap funds (higher volatility, higher returns)

**SIP Strategy:** Start with ₹5,000/month and increase by 10% annually. Consider tax-saving ELSS funds for 80C benefits.";

const TAX_REPLY: &str = "**Tax Saving Strategies for FY 2024-25:**

**Section 80C (₹1.5 Lakh limit):**
- ELSS Mutual Funds (3-year lock-in)
- PPF (15-year lock-in, 7.1% returns)
- Life Insurance Premium, NSC, Tax Saver FD

**Section 80D (Health Insurance):**
- Self & Family: ₹25,000
- Parents (60+): additional ₹50,000

**Home Loan Benefits:**
- 80C: Principal up to ₹1.5L
- 24(b): Interest up to ₹2L

**Tip:** The new tax regime has no deductions but lower rates. Calculate both to see which benefits you more.";

const STOCKS_REPLY: &str = "**Stock Market Insights:**

**Investment Tips:**
1. Diversify across sectors
2. Consider blue-chip stocks for stability
3. Keep 20% in cash for buying opportunities during dips

**Risk Management:**
- Never invest borrowed money
- Use stop-losses to limit downside
- Long-term SIP in index funds beats most active strategies";

const DEPOSITS_REPLY: &str = "**Fixed Deposit & Recurring Deposit Guide:**

**FD:**
- Large banks currently offer around 7% for 1-2 year tenures
- Small Finance Banks offer up to 9%

**RD Benefits:**
- Good for regular savings discipline
- Better than savings account interest
- Premature withdrawal possible with a penalty

**Tax Tip:** Interest above ₹40,000 (₹50,000 for seniors) is taxable. Tax-saver FDs with a 5-year lock-in qualify for 80C.";

const GENERAL_REPLY: &str = "**Financial Advisory:**

I can help you with:
- Mutual Fund & SIP recommendations
- Tax planning and deductions (80C, 80D)
- Stock market analysis
- FD/RD comparisons
- Goal-based investing
- GST and compliance queries

What specific financial topic would you like to explore?";

const REFUSAL_REPLY: &str = "**Non-Financial Query Detected**

I'm specifically designed to help with financial matters only.

Please ask me about:
- Investments (Mutual Funds, Stocks, FD/RD)
- Tax planning and GST
- Financial goals
- Market analysis

If you need help with something outside my expertise, please use the **\"Request Admin\"** button.";
