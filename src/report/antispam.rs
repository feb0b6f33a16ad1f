// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Anti-spam reports added by Exchange Online Protection

report_schema! {
    /// `X-Forefront-Antispam-Report`
    pub struct ForefrontAntispamReport("X-Forefront-Antispam-Report") {
        arc: "ARC" => "ARC protocol",
        ctry: "CTRY" => "Country/Region",
        lang: "LANG" => "Language",
        scl: "SCL" => "Spam Confidence Level",
        pcl: "PCL" => "Phishing Confidence Level",
        sfv: "SFV" => "Spam Filtering Verdict",
        ipv: "IPV" => "IP Filter Verdict",
        h: "H" => "HELO/EHLO String",
        ptr: "PTR" => "PTR Record",
        cip: "CIP" => "Connecting IP Address",
        cat: "CAT" => "Protection Policy Category",
        sfty: "SFTY" => "Phishing message",
        srv: "SRV" => "Bulk email status",
        custom_spam: "X-CustomSpam" => "Advanced Spam Filtering",
        sfs: "SFS" => "Spam rules",
    }
}

report_schema! {
    /// `X-Microsoft-Antispam`
    pub struct AntispamReport("X-Microsoft-Antispam") {
        bcl: "BCL" => "Bulk Complaint Level",
        pcl: "PCL" => "Phishing Confidence Level",
    }
}
